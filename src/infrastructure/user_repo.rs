use sqlx::SqlitePool;

use crate::domain::registry_model::User;
use crate::error::{AppError, Result};

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// ユーザー名が既に使われていれば Validation エラー
    pub async fn create(&self, user: &User) -> Result<()> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(&user.username)
            .fetch_one(&self.pool)
            .await?;
        if exists > 0 {
            return Err(AppError::Validation(format!(
                "Username {} is already taken",
                user.username
            )));
        }

        sqlx::query("INSERT INTO users (id, username, password_hash, salt, role) VALUES (?, ?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.salt)
            .bind(&user.role)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, salt, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
