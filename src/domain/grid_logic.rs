use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::domain::models::{CellId, CellStatus, HistoryAction, HistoryRecord, ScheduleCell, VanId, DAY_FORMAT};
use crate::domain::registry_model::{weekday_name, Groomer, Van};

#[derive(Debug, PartialEq, Eq)]
pub enum GridErrorKind {
    /// グリッドに存在しないバン
    UnknownVan(VanId),
    /// 日付が表現できる範囲を超える
    DateOutOfRange,
    /// 一度に作るセル数が上限を超える
    TooManyCells { requested: Option<usize>, limit: usize },
}

/// 初期化 / 日付追加で一度に書けるセル数の上限
pub const MAX_BULK_CELLS: usize = 50_000;

fn check_cell_count(rows: usize, days: usize) -> Result<usize, GridErrorKind> {
    match rows.checked_mul(days) {
        Some(total) if total <= MAX_BULK_CELLS => Ok(total),
        requested => Err(GridErrorKind::TooManyCells {
            requested,
            limit: MAX_BULK_CELLS,
        }),
    }
}

/// バン x 日付 の密な行列
/// rows[i][j] は vans[i] の days[j] のセル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleGrid {
    pub vans: Vec<Van>,
    pub days: Vec<NaiveDate>,
    pub rows: Vec<Vec<ScheduleCell>>,
}

impl ScheduleGrid {
    pub fn row_index(&self, van_id: VanId) -> Option<usize> {
        self.vans.iter().position(|van| van.id == van_id)
    }

    pub fn column_index(&self, day: NaiveDate) -> Option<usize> {
        self.days.binary_search(&day).ok()
    }

    pub fn cell(&self, id: CellId) -> Option<&ScheduleCell> {
        let row = self.row_index(id.van_id)?;
        let col = self.column_index(id.day)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }
}

/// 疎なセル一覧とバン一覧から密なグリッドを組み立てる純粋関数
///
/// - 行: バンID昇順
/// - 列: セルに現れる日付の重複なし昇順 (固定の期間ではない)
/// - 欠けている (van, day) は Blank で埋める
pub fn build_grid(cells: &[ScheduleCell], vans: &[Van]) -> ScheduleGrid {
    let mut vans: Vec<Van> = vans.to_vec();
    vans.sort_by_key(|van| van.id);
    vans.dedup_by_key(|van| van.id);

    let days: Vec<NaiveDate> = cells
        .iter()
        .map(|cell| cell.day)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // 同じキーが複数あれば先勝ち
    let mut cell_map: HashMap<CellId, &ScheduleCell> = HashMap::with_capacity(cells.len());
    for cell in cells {
        cell_map.entry(cell.cell_id()).or_insert(cell);
    }

    let rows = vans
        .iter()
        .map(|van| {
            days.iter()
                .map(|day| match cell_map.get(&CellId::new(van.id, *day)) {
                    Some(cell) => (*cell).clone(),
                    None => ScheduleCell::blank(van.id, *day),
                })
                .collect()
        })
        .collect();

    ScheduleGrid { vans, days, rows }
}

/// 1列分の割り当てのうち, 2回以上現れる値に true を立てる
/// 空白の割り当ては対象外
pub fn flag_duplicates<'a, I>(column: I) -> Vec<bool>
where
    I: IntoIterator<Item = &'a str>,
{
    let values: Vec<&str> = column.into_iter().map(str::trim).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().copied().filter(|v| !v.is_empty()) {
        *counts.entry(value).or_insert(0) += 1;
    }

    values
        .iter()
        .map(|value| !value.is_empty() && counts.get(value).copied().unwrap_or(0) > 1)
        .collect()
}

/// グリッド全体の重複フラグ (rows と同じ形)
pub fn duplicate_flags(grid: &ScheduleGrid) -> Vec<Vec<bool>> {
    let mut flags = vec![vec![false; grid.days.len()]; grid.rows.len()];

    for col in 0..grid.days.len() {
        let column = grid.rows.iter().map(|row| row[col].assignment.as_str());
        for (row, flagged) in flag_duplicates(column).into_iter().enumerate() {
            flags[row][col] = flagged;
        }
    }
    flags
}

/// ドラッグでのコピー結果
#[derive(Debug, Clone, PartialEq)]
pub struct DragCopy {
    pub cell: ScheduleCell,
    pub history: HistoryRecord,
}

fn describe_position(grid: &ScheduleGrid, van: &Van, day: NaiveDate) -> String {
    match grid.column_index(day) {
        Some(col) => format!("Van {}, Day {}", van.name, col + 1),
        None => format!("Van {}, {}", van.name, day.format(DAY_FORMAT)),
    }
}

/// source の割り当て/状態を destination にコピーする (移動ではない)
///
/// コピー先のキーに付け替えたセルと, コピー先に追記する履歴1件を返す
/// source が未作成なら Blank をコピーする
pub fn drag_copy(
    grid: &ScheduleGrid,
    source: CellId,
    destination: CellId,
    user: &str,
    timestamp: DateTime<Utc>,
) -> Result<DragCopy, GridErrorKind> {
    let source_van = grid
        .row_index(source.van_id)
        .map(|i| &grid.vans[i])
        .ok_or(GridErrorKind::UnknownVan(source.van_id))?;
    let destination_van = grid
        .row_index(destination.van_id)
        .map(|i| &grid.vans[i])
        .ok_or(GridErrorKind::UnknownVan(destination.van_id))?;

    let source_cell = grid
        .cell(source)
        .cloned()
        .unwrap_or_else(|| ScheduleCell::blank(source.van_id, source.day));

    let cell = ScheduleCell {
        van_id: destination.van_id,
        day: destination.day,
        assignment: source_cell.assignment.clone(),
        status: source_cell.status,
    };

    let note = format!(
        "Copied \"{}\" from {} to {} by {}",
        source_cell.assignment,
        describe_position(grid, source_van, source.day),
        describe_position(grid, destination_van, destination.day),
        user,
    );
    let history = HistoryRecord::for_cell(&cell, HistoryAction::DragDrop, note, user, timestamp);

    Ok(DragCopy { cell, history })
}

/// start から end まで (両端を含む) の日付
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    (0..=(end - start).num_days())
        .filter_map(|offset| start.checked_add_days(Days::new(offset as u64)))
        .collect()
}

/// van_id 1..=num_vans と start から num_days 日分の Blank セル
/// 上限超過と日付のオーバーフローはセルを作る前に弾く
pub fn blank_cells(num_vans: u32, num_days: u32, start: NaiveDate) -> Result<Vec<ScheduleCell>, GridErrorKind> {
    check_cell_count(num_vans as usize, num_days as usize)?;
    if num_days > 0 {
        start
            .checked_add_days(Days::new(u64::from(num_days) - 1))
            .ok_or(GridErrorKind::DateOutOfRange)?;
    }

    let days: Vec<NaiveDate> = (0..num_days)
        .filter_map(|offset| start.checked_add_days(Days::new(u64::from(offset))))
        .collect();
    Ok((1..=num_vans as VanId)
        .flat_map(|van_id| days.iter().map(move |day| ScheduleCell::blank(van_id, *day)))
        .collect())
}

/// 現在の最終日の翌日から end までを全バン分 Blank で作る
/// end <= last_day の場合は空
pub fn extension_cells(vans: &[Van], last_day: NaiveDate, end: NaiveDate) -> Result<Vec<ScheduleCell>, GridErrorKind> {
    if end <= last_day {
        return Ok(Vec::new());
    }
    let first_new_day = last_day.succ_opt().ok_or(GridErrorKind::DateOutOfRange)?;
    // 日数は先に数えて, 日付を並べる前に上限と比べる
    let span = usize::try_from((end - first_new_day).num_days() + 1).map_err(|_| GridErrorKind::DateOutOfRange)?;
    check_cell_count(vans.len(), span)?;

    let new_days = days_inclusive(first_new_day, end);
    Ok(vans
        .iter()
        .flat_map(|van| new_days.iter().map(move |day| ScheduleCell::blank(van.id, *day)))
        .collect())
}

/// 週テンプレートを日付に展開した1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSlot {
    pub date: NaiveDate,
    pub day: String,
    pub van_id: VanId,
}

/// グルーマーの週テンプレートを start..=end に展開する
/// テンプレートが指すバンが存在しない曜日は飛ばす
/// 1日1セルなので日数を MAX_BULK_CELLS で抑える
pub fn template_slots(
    groomer: &Groomer,
    vans: &[Van],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TemplateSlot>, GridErrorKind> {
    let span = (end - start).num_days() + 1;
    if span > MAX_BULK_CELLS as i64 {
        return Err(GridErrorKind::TooManyCells {
            requested: usize::try_from(span).ok(),
            limit: MAX_BULK_CELLS,
        });
    }

    Ok(days_inclusive(start, end)
        .into_iter()
        .filter_map(|date| {
            let weekday: Weekday = date.weekday();
            groomer.schedule.van_for(weekday, vans).map(|van_id| TemplateSlot {
                date,
                day: weekday_name(weekday).to_string(),
                van_id,
            })
        })
        .collect())
}

/// 展開結果を Scheduled のセルに変換する
pub fn template_cells(groomer: &Groomer, slots: &[TemplateSlot]) -> Vec<ScheduleCell> {
    slots
        .iter()
        .map(|slot| ScheduleCell {
            van_id: slot.van_id,
            day: slot.date,
            assignment: groomer.name.clone(),
            status: CellStatus::Scheduled,
        })
        .collect()
}
