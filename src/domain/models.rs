// =====================
// スケジュールのドメインモデル定義
// =====================

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type VanId = i64;
pub type GroomerId = i64;

/// 日付の文字列表現 (DB / API / cell_id で共通)
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// セルの状態
/// 遷移順序は強制しない (どの状態からどの状態へも変更可能)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellStatus {
    #[default]
    #[serde(alias = "")]
    Blank,
    Scheduled,
    #[serde(rename = "Called Out", alias = "Callout", alias = "CalledOut")]
    CalledOut,
    #[serde(rename = "Filled In", alias = "FilledIn")]
    FilledIn,
    #[serde(rename = "Time Off", alias = "TimeOff")]
    TimeOff,
    Event,
    Terminated,
}

impl CellStatus {
    pub const ALL: [CellStatus; 7] = [
        CellStatus::Blank,
        CellStatus::Scheduled,
        CellStatus::CalledOut,
        CellStatus::FilledIn,
        CellStatus::TimeOff,
        CellStatus::Event,
        CellStatus::Terminated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CellStatus::Blank => "Blank",
            CellStatus::Scheduled => "Scheduled",
            CellStatus::CalledOut => "Called Out",
            CellStatus::FilledIn => "Filled In",
            CellStatus::TimeOff => "Time Off",
            CellStatus::Event => "Event",
            CellStatus::Terminated => "Terminated",
        }
    }
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown cell status: {:?}", self.0)
    }
}

impl FromStr for CellStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(CellStatus::Blank),
            // 旧編集モーダルの表記と空白なしの表記
            "Callout" | "CalledOut" => Ok(CellStatus::CalledOut),
            "FilledIn" => Ok(CellStatus::FilledIn),
            "TimeOff" => Ok(CellStatus::TimeOff),
            other => CellStatus::ALL
                .iter()
                .copied()
                .find(|status| status.as_str() == other)
                .ok_or_else(|| UnknownStatus(other.to_string())),
        }
    }
}

/// (van_id, day) で一意に決まるスケジュールの1マス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleCell {
    pub van_id: VanId,
    pub day: NaiveDate,
    #[serde(default)]
    pub assignment: String,
    #[serde(default)]
    pub status: CellStatus,
}

impl ScheduleCell {
    pub fn blank(van_id: VanId, day: NaiveDate) -> Self {
        Self {
            van_id,
            day,
            assignment: String::new(),
            status: CellStatus::Blank,
        }
    }

    pub fn cell_id(&self) -> CellId {
        CellId::new(self.van_id, self.day)
    }

    pub fn has_assignment(&self) -> bool {
        !self.assignment.trim().is_empty()
    }
}

/// 履歴と結びつけるためのセルの複合キー `"<van_id>-<YYYY-MM-DD>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    pub van_id: VanId,
    pub day: NaiveDate,
}

impl CellId {
    pub fn new(van_id: VanId, day: NaiveDate) -> Self {
        Self { van_id, day }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.van_id, self.day.format(DAY_FORMAT))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCellId(pub String);

impl fmt::Display for InvalidCellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cell id: {:?} (expected <van_id>-<YYYY-MM-DD>)", self.0)
    }
}

impl FromStr for CellId {
    type Err = InvalidCellId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 日付側にも '-' が含まれるので最初の '-' で分割する
        let (van, day) = s
            .split_once('-')
            .ok_or_else(|| InvalidCellId(s.to_string()))?;
        let van_id = van
            .parse::<VanId>()
            .map_err(|_| InvalidCellId(s.to_string()))?;
        let day = NaiveDate::parse_from_str(day, DAY_FORMAT)
            .map_err(|_| InvalidCellId(s.to_string()))?;
        Ok(Self { van_id, day })
    }
}

/// 履歴の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    /// 編集モーダルからの更新
    Updated,
    /// ドラッグでのコピー
    DragDrop,
    /// 週テンプレートの適用
    Template,
    /// グルーマー予定の一括削除
    Cleared,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Updated => "updated",
            HistoryAction::DragDrop => "drag-drop",
            HistoryAction::Template => "template",
            HistoryAction::Cleared => "cleared",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 追記専用の履歴レコード
/// 保存前は id が None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HistoryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub cell_id: String,
    pub action: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub status: String,
    pub note: String,
    pub user: String,
}

impl HistoryRecord {
    /// セル変更に対応する履歴を作る
    pub fn for_cell(
        cell: &ScheduleCell,
        action: HistoryAction,
        note: impl Into<String>,
        user: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            cell_id: cell.cell_id().to_string(),
            action: action.as_str().to_string(),
            date: cell.day,
            timestamp,
            name: cell.assignment.clone(),
            status: cell.status.as_str().to_string(),
            note: note.into(),
            user: user.to_string(),
        }
    }
}

/// どのボード (本番 / モデリング) を操作するか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleBoard {
    Master,
    Model,
}

impl ScheduleBoard {
    pub fn schedule_table(&self) -> &'static str {
        match self {
            ScheduleBoard::Master => "schedule",
            ScheduleBoard::Model => "model_schedule",
        }
    }

    pub fn vans_table(&self) -> &'static str {
        match self {
            ScheduleBoard::Master => "vans",
            ScheduleBoard::Model => "model_vans",
        }
    }

    pub fn groomers_table(&self) -> &'static str {
        match self {
            ScheduleBoard::Master => "groomers",
            ScheduleBoard::Model => "model_groomers",
        }
    }
}
