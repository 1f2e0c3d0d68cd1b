use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domain::grid_logic::GridErrorKind;
use crate::domain::models::{InvalidCellId, UnknownStatus};

/// API 全体で使うエラー
#[derive(Error, Debug)]
pub enum AppError {
    /// 書き込み前に弾く入力エラー
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 一括処理の失敗をまとめたもの (途中で止めずに全件集める)
    #[error("{failed} of {total} writes failed: {}", .messages.join(", "))]
    Bulk {
        failed: usize,
        total: usize,
        messages: Vec<String>,
    },

    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::Token(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Bulk { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<UnknownStatus> for AppError {
    fn from(err: UnknownStatus) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<InvalidCellId> for AppError {
    fn from(err: InvalidCellId) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<GridErrorKind> for AppError {
    fn from(err: GridErrorKind) -> Self {
        match err {
            GridErrorKind::UnknownVan(id) => AppError::NotFound(format!("Van {} not found", id)),
            GridErrorKind::DateOutOfRange => {
                AppError::Validation("date range runs past the supported calendar".to_string())
            }
            GridErrorKind::TooManyCells { requested: Some(n), limit } => {
                AppError::Validation(format!("request would write {} cells (limit {})", n, limit))
            }
            GridErrorKind::TooManyCells { requested: None, limit } => {
                AppError::Validation(format!("request would write more than {} cells", limit))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("request rejected ({}): {}", status, self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
