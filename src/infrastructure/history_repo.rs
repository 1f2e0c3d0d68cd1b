use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

use crate::domain::models::HistoryRecord;
use crate::error::Result;

/// レポートで「絞り込みなし」を表すステータス
pub const ALL_STATUSES: &str = "All";

pub struct HistoryRepository {
    pool: SqlitePool,
}

/// 履歴1件を書き込む (トランザクション内からも呼べるように接続を受け取る)
pub(crate) async fn insert_history(conn: &mut SqliteConnection, record: &HistoryRecord) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO event_history (cell_id, action, date, timestamp, name, status, note, user)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.cell_id)
    .bind(&record.action)
    .bind(record.date)
    .bind(record.timestamp)
    .bind(&record.name)
    .bind(&record.status)
    .bind(&record.note)
    .bind(&record.user)
    .execute(conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

impl HistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =================================================================
    // 1. 追記
    // =================================================================

    pub async fn append(&self, record: &HistoryRecord) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        insert_history(&mut conn, record).await
    }

    // =================================================================
    // 2. 参照
    // =================================================================

    /// セル単位の履歴 (新しい順)
    pub async fn find_by_cell(&self, cell_id: &str) -> Result<Vec<HistoryRecord>> {
        let records = sqlx::query_as::<_, HistoryRecord>(
            "SELECT id, cell_id, action, date, timestamp, name, status, note, user
             FROM event_history
             WHERE cell_id = ?
             ORDER BY timestamp DESC, id DESC",
        )
        .bind(cell_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// 期間 (両端含む) とステータスで絞り込んだ履歴
    /// status が None か "All" なら絞り込まない
    pub async fn report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        status: Option<&str>,
    ) -> Result<Vec<HistoryRecord>> {
        let status = status.map(str::trim).filter(|s| !s.is_empty() && *s != ALL_STATUSES);

        let records = match status {
            Some(status) => {
                sqlx::query_as::<_, HistoryRecord>(
                    "SELECT id, cell_id, action, date, timestamp, name, status, note, user
                     FROM event_history
                     WHERE date BETWEEN ? AND ? AND status = ?
                     ORDER BY timestamp DESC, id DESC",
                )
                .bind(start)
                .bind(end)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, HistoryRecord>(
                    "SELECT id, cell_id, action, date, timestamp, name, status, note, user
                     FROM event_history
                     WHERE date BETWEEN ? AND ?
                     ORDER BY timestamp DESC, id DESC",
                )
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(records)
    }
}
