use std::time::Duration;

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;

use groom_scheduler_lib::application::auth::{AuthSettings, AuthUser};
use groom_scheduler_lib::AppServices;

// テスト用DBセットアップ
// メモリDBは接続ごとに別物になるので接続は1本に絞る
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create memory pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to create schema");

    pool
}

// 一時ファイルDB (複数接続で同時に書き込ませたいテスト用)
// TempDir を落とすとファイルも消えるので一緒に返す
pub async fn setup_file_db(max_connections: u32) -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("schedule.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .expect("Failed to create file pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to create schema");

    (dir, pool)
}

pub fn test_auth() -> AuthSettings {
    AuthSettings {
        secret: "test-secret".to_string(),
        token_ttl_secs: 600,
        pbkdf2_iterations: 1_000,
    }
}

pub async fn setup_services() -> AppServices {
    AppServices::new(setup_test_db().await, test_auth())
}

pub fn admin() -> AuthUser {
    AuthUser {
        username: "admin".to_string(),
        role: "admin".to_string(),
    }
}

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("bad test date")
}
