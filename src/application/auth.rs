//! パスワードハッシュ / JWT / 認可ミドルウェア

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::registry_model::User;
use crate::error::{AppError, Result};
use crate::AppServices;

pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// トークン発行と検証の設定
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub token_ttl_secs: u64,
    pub pbkdf2_iterations: u32,
}

impl AuthSettings {
    pub fn new(secret: impl Into<String>, token_ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            token_ttl_secs,
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub role: String,
    pub exp: u64,
    pub iat: u64,
}

/// 認証済みユーザー (リクエストの extensions に入る)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

// =====================
// パスワード
// =====================

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// (password_hash, salt) を返す
/// password_hash は `<iterations>$<base64>` 形式
pub fn hash_password(password: &str, iterations: u32) -> (String, String) {
    let iterations = iterations.max(1);
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    let key = derive_key(password, &salt, iterations);
    (format!("{}${}", iterations, B64.encode(key)), B64.encode(salt))
}

pub fn verify_password(password: &str, password_hash: &str, salt: &str) -> bool {
    let Some((iterations, expected)) = password_hash.split_once('$') else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (B64.decode(salt), B64.decode(expected)) else {
        return false;
    };
    // 長さ違いも ct_eq が false を返す
    let key = derive_key(password, &salt, iterations.max(1));
    key.as_slice().ct_eq(expected.as_slice()).into()
}

// PBKDF2 は重いので tokio のワーカーを塞がないよう blocking スレッドで回す

pub async fn hash_password_blocking(password: &str, iterations: u32) -> Result<(String, String)> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password, iterations))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

pub async fn verify_password_blocking(password: &str, password_hash: &str, salt: &str) -> Result<bool> {
    let (password, password_hash, salt) = (password.to_string(), password_hash.to_string(), salt.to_string());
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash, &salt))
        .await
        .map_err(|e| AppError::Internal(format!("password check failed: {}", e)))
}

// =====================
// トークン
// =====================

fn now_secs() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn issue_token(settings: &AuthSettings, user: &User) -> Result<String> {
    let iat = now_secs()?;
    let claims = Claims {
        sub: user.username.clone(),
        role: user.role.clone(),
        exp: iat + settings.token_ttl_secs,
        iat,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )?;
    Ok(token)
}

/// 署名と有効期限を検証する (失敗は 403)
pub fn verify_token(settings: &AuthSettings, token: &str) -> Result<AuthUser> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )?;
    Ok(AuthUser {
        username: data.claims.sub,
        role: data.claims.role,
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =====================
// ミドルウェア
// =====================

/// トークンなし -> 401, 不正/期限切れ -> 403
pub async fn require_auth(
    State(services): State<Arc<AppServices>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;
    let user = verify_token(&services.auth, token)?;
    tracing::debug!("authenticated {} ({})", user.username, user.role);

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// require_auth の内側に置く
pub async fn require_admin(request: Request, next: Next) -> Result<Response> {
    let is_admin = request
        .extensions()
        .get::<AuthUser>()
        .is_some_and(AuthUser::is_admin);
    if !is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(next.run(request).await)
}
