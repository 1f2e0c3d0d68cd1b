use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::grid_logic::{duplicate_flags, ScheduleGrid, TemplateSlot};
use crate::domain::models::{CellStatus, GroomerId, HistoryRecord, ScheduleCell, VanId};
use crate::domain::registry_model::{Van, WeeklyTemplate};
use crate::error::AppError;
use crate::infrastructure::bulk::BulkOutcome;

/// JSON の形が合わない場合も `{"error": ...}` の 400 で返すための Json
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

// =====================
// 共通レスポンス
// =====================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), id: None }
    }

    pub fn with_id(message: impl Into<String>, id: i64) -> Self {
        Self { message: message.into(), id: Some(id) }
    }
}

/// 一括処理の結果 (件数つき)
#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: BulkOutcome,
}

// =====================
// 認証
// =====================

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// =====================
// レジストリ
// =====================

#[derive(Debug, Deserialize)]
pub struct VanRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GroomerRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub schedule: WeeklyTemplate,
    #[serde(default)]
    pub inactive: bool,
}

// =====================
// グリッド表示
// =====================

#[derive(Debug, Serialize)]
pub struct GridCellView {
    pub cell_id: String,
    pub van_id: VanId,
    pub day: NaiveDate,
    pub assignment: String,
    pub status: CellStatus,
    /// 同じ日に同じ割り当てが他にもある
    pub duplicate: bool,
}

#[derive(Debug, Serialize)]
pub struct GridRowView {
    pub van: Van,
    pub cells: Vec<GridCellView>,
}

#[derive(Debug, Serialize)]
pub struct GridView {
    pub days: Vec<NaiveDate>,
    pub rows: Vec<GridRowView>,
}

impl From<&ScheduleGrid> for GridView {
    fn from(grid: &ScheduleGrid) -> Self {
        let flags = duplicate_flags(grid);

        let rows = grid
            .vans
            .iter()
            .zip(grid.rows.iter().zip(flags))
            .map(|(van, (cells, row_flags))| GridRowView {
                van: van.clone(),
                cells: cells
                    .iter()
                    .zip(row_flags)
                    .map(|(cell, duplicate)| GridCellView {
                        cell_id: cell.cell_id().to_string(),
                        van_id: cell.van_id,
                        day: cell.day,
                        assignment: cell.assignment.clone(),
                        status: cell.status,
                        duplicate,
                    })
                    .collect(),
            })
            .collect();

        GridView { days: grid.days.clone(), rows }
    }
}

// =====================
// セル操作
// =====================

#[derive(Debug, Deserialize)]
pub struct EditCellRequest {
    pub van_id: VanId,
    pub day: String,
    #[serde(default)]
    pub assignment: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct DragCopyRequest {
    /// コピー元の cell_id
    pub source: String,
    /// コピー先の cell_id
    pub destination: String,
}

/// セル1件の変更結果 (書き込んだセルと追記した履歴)
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub cell: ScheduleCell,
    pub history: HistoryRecord,
}

// =====================
// 一括初期化 / 日付追加
// =====================

#[derive(Debug, Default, Deserialize)]
pub struct InitializeRequest {
    pub num_vans: Option<u32>,
    pub num_days: Option<u32>,
    pub start_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddDaysRequest {
    /// 省略時はストアの最終日
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// =====================
// ユーティリティ
// =====================

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub groomer_id: GroomerId,
    #[serde(default)]
    pub start_date: String,
}

#[derive(Debug, Serialize)]
pub struct TemplatePreview {
    pub groomer: String,
    pub slots: Vec<TemplateSlot>,
}

/// 対象バンの指定
/// `"ALL"`, `"1,3"` のようなカンマ区切り, もしくは ID 配列
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VanSelection {
    Ids(Vec<VanId>),
    Text(String),
}

impl Default for VanSelection {
    fn default() -> Self {
        VanSelection::Text("ALL".to_string())
    }
}

impl VanSelection {
    /// None は全バン
    pub fn to_filter(&self) -> Result<Option<Vec<VanId>>, AppError> {
        match self {
            VanSelection::Ids(ids) if ids.is_empty() => Ok(None),
            VanSelection::Ids(ids) => Ok(Some(ids.clone())),
            VanSelection::Text(text) => {
                let text = text.trim();
                if text.is_empty() || text.eq_ignore_ascii_case("ALL") {
                    return Ok(None);
                }
                text.split(',')
                    .map(|part| {
                        part.trim()
                            .parse::<VanId>()
                            .map_err(|_| AppError::Validation(format!("invalid van id: {:?}", part.trim())))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Some)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClearScheduleRequest {
    pub groomer_id: GroomerId,
    #[serde(default)]
    pub target_date: String,
    #[serde(default)]
    pub vans: VanSelection,
}

// =====================
// 履歴
// =====================

#[derive(Debug, Default, Deserialize)]
pub struct AppendHistoryRequest {
    #[serde(default)]
    pub cell_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub note: String,
    /// 省略時はトークンのユーザー
    pub user: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn van_selection_accepts_keyword_list_and_array() {
        let all: VanSelection = serde_json::from_str(r#""ALL""#).unwrap();
        assert_eq!(all.to_filter().unwrap(), None);

        let listed: VanSelection = serde_json::from_str(r#""1, 3""#).unwrap();
        assert_eq!(listed.to_filter().unwrap(), Some(vec![1, 3]));

        let array: VanSelection = serde_json::from_str("[2]").unwrap();
        assert_eq!(array.to_filter().unwrap(), Some(vec![2]));

        let broken: VanSelection = serde_json::from_str(r#""1,x""#).unwrap();
        assert!(broken.to_filter().is_err());
    }
}
