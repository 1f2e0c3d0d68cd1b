use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};

use crate::domain::models::{CellId, CellStatus, HistoryRecord, ScheduleBoard, ScheduleCell, VanId};
use crate::error::Result;
use crate::infrastructure::bulk::{scatter_gather, BulkOutcome};
use crate::infrastructure::history_repo::insert_history;

// DB の1行 (status はテキストのまま読む)
#[derive(Debug, FromRow)]
struct CellRow {
    van_id: VanId,
    day: NaiveDate,
    assignment: String,
    status: String,
}

impl From<CellRow> for ScheduleCell {
    fn from(row: CellRow) -> Self {
        let status = row.status.parse::<CellStatus>().unwrap_or_else(|e| {
            tracing::warn!("{} at {}-{}, reading as Blank", e, row.van_id, row.day);
            CellStatus::Blank
        });
        ScheduleCell {
            van_id: row.van_id,
            day: row.day,
            assignment: row.assignment,
            status,
        }
    }
}

pub struct ScheduleRepository {
    pool: SqlitePool,
}

impl ScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =================================================================
    // 1. 読み込み
    // =================================================================

    pub async fn list_cells(&self, board: ScheduleBoard) -> Result<Vec<ScheduleCell>> {
        let sql = format!(
            "SELECT van_id, day, assignment, status FROM {} ORDER BY van_id, day",
            board.schedule_table()
        );
        let rows = sqlx::query_as::<_, CellRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ScheduleCell::from).collect())
    }

    pub async fn find_cell(&self, board: ScheduleBoard, id: CellId) -> Result<Option<ScheduleCell>> {
        let sql = format!(
            "SELECT van_id, day, assignment, status FROM {} WHERE van_id = ? AND day = ?",
            board.schedule_table()
        );
        let row = sqlx::query_as::<_, CellRow>(&sql)
            .bind(id.van_id)
            .bind(id.day)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ScheduleCell::from))
    }

    /// ストア上の最終日 (空なら None)
    pub async fn last_day(&self, board: ScheduleBoard) -> Result<Option<NaiveDate>> {
        let sql = format!("SELECT MAX(day) FROM {}", board.schedule_table());
        let day: Option<NaiveDate> = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(day)
    }

    /// 指定グルーマーが day 以降に入っているセル
    /// vans が None なら全バン
    pub async fn find_assigned_cells(
        &self,
        assignment: &str,
        from_day: NaiveDate,
        vans: Option<&[VanId]>,
    ) -> Result<Vec<ScheduleCell>> {
        let rows = sqlx::query_as::<_, CellRow>(
            "SELECT van_id, day, assignment, status FROM schedule
             WHERE assignment = ? AND day >= ?
             ORDER BY day, van_id",
        )
        .bind(assignment)
        .bind(from_day)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(ScheduleCell::from)
            .filter(|cell| vans.map_or(true, |ids| ids.contains(&cell.van_id)))
            .collect())
    }

    // =================================================================
    // 2. 単体の書き込み
    // =================================================================

    /// (van_id, day) をキーに上書き保存
    pub async fn upsert_cell(&self, board: ScheduleBoard, cell: &ScheduleCell) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (van_id, day, assignment, status) VALUES (?, ?, ?, ?)",
            board.schedule_table()
        );
        sqlx::query(&sql)
            .bind(cell.van_id)
            .bind(cell.day)
            .bind(&cell.assignment)
            .bind(cell.status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// 既存セルがあれば何もしない
    /// 新規に作った場合だけ true
    pub async fn insert_missing_cell(&self, board: ScheduleBoard, cell: &ScheduleCell) -> Result<bool> {
        let sql = format!(
            "INSERT INTO {} (van_id, day, assignment, status) VALUES (?, ?, ?, ?)
             ON CONFLICT (van_id, day) DO NOTHING",
            board.schedule_table()
        );
        let result = sqlx::query(&sql)
            .bind(cell.van_id)
            .bind(cell.day)
            .bind(&cell.assignment)
            .bind(cell.status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// セルの上書きと履歴の追記を1トランザクションで行う
    /// どちらかが失敗すれば両方とも書かれない
    pub async fn apply_mutation(&self, cell: &ScheduleCell, history: &HistoryRecord) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR REPLACE INTO schedule (van_id, day, assignment, status) VALUES (?, ?, ?, ?)")
            .bind(cell.van_id)
            .bind(cell.day)
            .bind(&cell.assignment)
            .bind(cell.status.as_str())
            .execute(&mut *tx)
            .await?;

        let history_id = insert_history(&mut tx, history).await?;

        tx.commit().await?;
        Ok(history_id)
    }

    // =================================================================
    // 3. 一括書き込み (1セル1書き込み, 失敗は集計)
    // =================================================================

    pub async fn bulk_upsert(&self, board: ScheduleBoard, cells: &[ScheduleCell]) -> BulkOutcome {
        scatter_gather(cells.iter().map(|cell| self.upsert_cell(board, cell))).await
    }

    pub async fn bulk_insert_missing(&self, board: ScheduleBoard, cells: &[ScheduleCell]) -> BulkOutcome {
        scatter_gather(cells.iter().map(|cell| self.insert_missing_cell(board, cell))).await
    }

    pub async fn bulk_apply_mutations(&self, mutations: &[(ScheduleCell, HistoryRecord)]) -> BulkOutcome {
        scatter_gather(
            mutations
                .iter()
                .map(|(cell, history)| self.apply_mutation(cell, history)),
        )
        .await
    }
}
