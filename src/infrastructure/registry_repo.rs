use sqlx::{FromRow, SqlitePool};

use crate::domain::models::{GroomerId, ScheduleBoard, VanId};
use crate::domain::registry_model::{Groomer, Van, WeeklyTemplate};
use crate::error::{AppError, Result};

// schedule は JSON テキスト, inactive は 0/1 で保存している
#[derive(Debug, FromRow)]
struct GroomerRow {
    id: GroomerId,
    name: String,
    schedule: String,
    inactive: i64,
}

impl From<GroomerRow> for Groomer {
    fn from(row: GroomerRow) -> Self {
        let schedule = serde_json::from_str::<WeeklyTemplate>(&row.schedule).unwrap_or_else(|e| {
            tracing::warn!("groomer {} has an unreadable schedule ({}), using empty", row.id, e);
            WeeklyTemplate::default()
        });
        Groomer {
            id: row.id,
            name: row.name,
            schedule,
            inactive: row.inactive != 0,
        }
    }
}

fn template_json(template: &WeeklyTemplate) -> Result<String> {
    serde_json::to_string(template).map_err(|e| AppError::Internal(e.to_string()))
}

pub struct RegistryRepository {
    pool: SqlitePool,
}

impl RegistryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =================================================================
    // 1. Van
    // =================================================================

    pub async fn list_vans(&self, board: ScheduleBoard) -> Result<Vec<Van>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY id", board.vans_table());
        let vans = sqlx::query_as::<_, Van>(&sql).fetch_all(&self.pool).await?;
        Ok(vans)
    }

    pub async fn find_van(&self, id: VanId) -> Result<Option<Van>> {
        let van = sqlx::query_as::<_, Van>("SELECT id, name FROM vans WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(van)
    }

    pub async fn add_van(&self, name: &str) -> Result<i64> {
        let id = sqlx::query("INSERT INTO vans (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(id)
    }

    pub async fn update_van(&self, id: VanId, name: &str) -> Result<()> {
        let result = sqlx::query("UPDATE vans SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Van {} not found", id)));
        }
        Ok(())
    }

    // セルは消さない (同じIDで作り直せば残りのセルがまた見える)
    pub async fn delete_van(&self, id: VanId) -> Result<()> {
        let result = sqlx::query("DELETE FROM vans WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Van {} not found", id)));
        }
        Ok(())
    }

    // =================================================================
    // 2. Groomer
    // =================================================================

    pub async fn list_groomers(&self, board: ScheduleBoard) -> Result<Vec<Groomer>> {
        let sql = format!(
            "SELECT id, name, schedule, inactive FROM {} ORDER BY id",
            board.groomers_table()
        );
        let rows = sqlx::query_as::<_, GroomerRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Groomer::from).collect())
    }

    pub async fn find_groomer(&self, id: GroomerId) -> Result<Option<Groomer>> {
        let row = sqlx::query_as::<_, GroomerRow>(
            "SELECT id, name, schedule, inactive FROM groomers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Groomer::from))
    }

    pub async fn add_groomer(&self, name: &str, schedule: &WeeklyTemplate, inactive: bool) -> Result<i64> {
        let id = sqlx::query("INSERT INTO groomers (name, schedule, inactive) VALUES (?, ?, ?)")
            .bind(name)
            .bind(template_json(schedule)?)
            .bind(inactive)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(id)
    }

    pub async fn update_groomer(
        &self,
        id: GroomerId,
        name: &str,
        schedule: &WeeklyTemplate,
        inactive: bool,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE groomers SET name = ?, schedule = ?, inactive = ? WHERE id = ?")
            .bind(name)
            .bind(template_json(schedule)?)
            .bind(inactive)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Groomer {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete_groomer(&self, id: GroomerId) -> Result<()> {
        let result = sqlx::query("DELETE FROM groomers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Groomer {} not found", id)));
        }
        Ok(())
    }
}
