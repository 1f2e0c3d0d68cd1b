//! API から呼ばれる操作
//! 入力の検証はここで済ませ, 書き込みはリポジトリに任せる

use chrono::{NaiveDate, Utc};

use crate::application::auth::{hash_password_blocking, issue_token, verify_password_blocking, AuthUser};
use crate::application::dto::*;
use crate::application::time::{parse_day, parse_optional_day, require_day};
use crate::domain::grid_logic::{self, build_grid, ScheduleGrid};
use crate::domain::models::{
    CellId, CellStatus, GroomerId, HistoryAction, HistoryRecord, ScheduleBoard, ScheduleCell, VanId,
};
use crate::domain::registry_model::{Groomer, User, Van};
use crate::error::{AppError, Result};
use crate::AppServices;

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

// =====================
// 認証
// =====================

pub async fn register(services: &AppServices, req: RegisterRequest) -> Result<MessageResponse> {
    if req.username.trim().is_empty() || req.password.is_empty() || req.role.trim().is_empty() {
        return Err(AppError::Validation(
            "username, password, and role are required".to_string(),
        ));
    }

    let (password_hash, salt) = hash_password_blocking(&req.password, services.auth.pbkdf2_iterations).await?;
    let id = match req.id.filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => Utc::now().timestamp_millis().to_string(),
    };
    let user = User {
        id,
        username: req.username.trim().to_string(),
        password_hash,
        salt,
        role: req.role.trim().to_string(),
    };
    services.users.create(&user).await?;

    tracing::info!("registered user {} ({})", user.username, user.role);
    Ok(MessageResponse::new("User registered successfully"))
}

pub async fn login(services: &AppServices, req: LoginRequest) -> Result<TokenResponse> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("username and password are required".to_string()));
    }

    let user = services
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !verify_password_blocking(&req.password, &user.password_hash, &user.salt).await? {
        tracing::info!("rejected login for {}", user.username);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = issue_token(&services.auth, &user)?;
    Ok(TokenResponse { token })
}

// =====================
// バン
// =====================

pub async fn list_vans(services: &AppServices, board: ScheduleBoard) -> Result<Vec<Van>> {
    services.registry.list_vans(board).await
}

pub async fn add_van(services: &AppServices, req: VanRequest) -> Result<MessageResponse> {
    required("name", &req.name)?;
    let id = services.registry.add_van(req.name.trim()).await?;
    Ok(MessageResponse::with_id("Van added", id))
}

pub async fn update_van(services: &AppServices, id: VanId, req: VanRequest) -> Result<MessageResponse> {
    required("name", &req.name)?;
    services.registry.update_van(id, req.name.trim()).await?;
    Ok(MessageResponse::new("Van updated"))
}

pub async fn delete_van(services: &AppServices, id: VanId) -> Result<MessageResponse> {
    services.registry.delete_van(id).await?;
    Ok(MessageResponse::new("Van deleted"))
}

// =====================
// グルーマー
// =====================

pub async fn list_groomers(services: &AppServices, board: ScheduleBoard) -> Result<Vec<Groomer>> {
    services.registry.list_groomers(board).await
}

pub async fn add_groomer(services: &AppServices, req: GroomerRequest) -> Result<MessageResponse> {
    required("name", &req.name)?;
    let id = services
        .registry
        .add_groomer(req.name.trim(), &req.schedule, req.inactive)
        .await?;
    Ok(MessageResponse::with_id("Groomer added", id))
}

pub async fn update_groomer(
    services: &AppServices,
    id: GroomerId,
    req: GroomerRequest,
) -> Result<MessageResponse> {
    required("name", &req.name)?;
    services
        .registry
        .update_groomer(id, req.name.trim(), &req.schedule, req.inactive)
        .await?;
    Ok(MessageResponse::new("Groomer updated"))
}

pub async fn delete_groomer(services: &AppServices, id: GroomerId) -> Result<MessageResponse> {
    services.registry.delete_groomer(id).await?;
    Ok(MessageResponse::new("Groomer deleted"))
}

async fn active_groomer(services: &AppServices, id: GroomerId) -> Result<Groomer> {
    let groomer = services
        .registry
        .find_groomer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Groomer {} not found", id)))?;
    if groomer.inactive {
        return Err(AppError::Validation(format!("Groomer {} is inactive", groomer.name)));
    }
    Ok(groomer)
}

// =====================
// スケジュール (セル一覧 / グリッド)
// =====================

pub async fn list_cells(services: &AppServices, board: ScheduleBoard) -> Result<Vec<ScheduleCell>> {
    services.schedule.list_cells(board).await
}

async fn load_grid(services: &AppServices, board: ScheduleBoard) -> Result<ScheduleGrid> {
    let (cells, vans) = tokio::try_join!(
        services.schedule.list_cells(board),
        services.registry.list_vans(board),
    )?;
    Ok(build_grid(&cells, &vans))
}

pub async fn grid_view(services: &AppServices, board: ScheduleBoard) -> Result<GridView> {
    let grid = load_grid(services, board).await?;
    Ok(GridView::from(&grid))
}

/// セル配列の一括上書き (履歴は書かない)
pub async fn bulk_save(
    services: &AppServices,
    board: ScheduleBoard,
    cells: Vec<ScheduleCell>,
) -> Result<BulkResponse> {
    let outcome = services.schedule.bulk_upsert(board, &cells).await.into_result()?;
    tracing::info!("bulk saved {} cells", outcome.written);
    Ok(BulkResponse {
        message: "Schedule updated successfully.".to_string(),
        outcome,
    })
}

// =====================
// セルの変更 (上書き + 履歴)
// =====================

async fn ensure_van(services: &AppServices, id: VanId) -> Result<()> {
    match services.registry.find_van(id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Van {} not found", id))),
    }
}

/// 編集モーダルからの更新
pub async fn edit_cell(services: &AppServices, user: &AuthUser, req: EditCellRequest) -> Result<MutationResponse> {
    let day = parse_day("day", &req.day)?;
    let status: CellStatus = req.status.parse()?;
    ensure_van(services, req.van_id).await?;

    let cell = ScheduleCell {
        van_id: req.van_id,
        day,
        assignment: req.assignment.trim().to_string(),
        status,
    };
    let mut history = HistoryRecord::for_cell(&cell, HistoryAction::Updated, req.note, &user.username, Utc::now());
    history.id = Some(services.schedule.apply_mutation(&cell, &history).await?);

    Ok(MutationResponse { cell, history })
}

pub async fn drag_copy(services: &AppServices, user: &AuthUser, req: DragCopyRequest) -> Result<MutationResponse> {
    let source: CellId = req.source.trim().parse()?;
    let destination: CellId = req.destination.trim().parse()?;

    let grid = load_grid(services, ScheduleBoard::Master).await?;
    let copy = grid_logic::drag_copy(&grid, source, destination, &user.username, Utc::now())?;

    let mut history = copy.history;
    history.id = Some(services.schedule.apply_mutation(&copy.cell, &history).await?);
    tracing::info!("{}", history.note);

    Ok(MutationResponse { cell: copy.cell, history })
}

// =====================
// 一括初期化 / 日付追加
// =====================

pub async fn initialize_grid(services: &AppServices, req: InitializeRequest) -> Result<BulkResponse> {
    let missing = || AppError::Validation("num_vans, num_days, and start_date are required".to_string());
    let num_vans = req.num_vans.filter(|n| *n > 0).ok_or_else(missing)?;
    let num_days = req.num_days.filter(|n| *n > 0).ok_or_else(missing)?;
    let start = parse_optional_day("start_date", req.start_date.as_deref())?.ok_or_else(missing)?;

    let cells = grid_logic::blank_cells(num_vans, num_days, start)?;
    let outcome = services
        .schedule
        .bulk_upsert(ScheduleBoard::Master, &cells)
        .await
        .into_result()?;

    tracing::info!("initialized {} vans x {} days from {}", num_vans, num_days, start);
    Ok(BulkResponse {
        message: "Schedule initialized successfully".to_string(),
        outcome,
    })
}

/// 既存の最終日の翌日から end まで, 全バン分の Blank を足す
/// 既にあるセルは触らない
pub async fn add_days(services: &AppServices, req: AddDaysRequest) -> Result<BulkResponse> {
    let end = require_day("end_date", req.end_date.as_deref())?;
    let last_day: NaiveDate = match parse_optional_day("start_date", req.start_date.as_deref())? {
        Some(start) => start,
        None => services
            .schedule
            .last_day(ScheduleBoard::Master)
            .await?
            .ok_or_else(|| {
                AppError::Validation("Schedule is empty. Initialize it or give a start_date.".to_string())
            })?,
    };
    if end <= last_day {
        return Err(AppError::Validation(format!(
            "end_date must be after {}",
            last_day
        )));
    }

    let vans = services.registry.list_vans(ScheduleBoard::Master).await?;
    if vans.is_empty() {
        return Err(AppError::Validation("No vans found. Please add vans first.".to_string()));
    }

    let cells = grid_logic::extension_cells(&vans, last_day, end)?;
    let outcome = services
        .schedule
        .bulk_insert_missing(ScheduleBoard::Master, &cells)
        .await
        .into_result()?;

    tracing::info!("added days {} ..= {} for {} vans", last_day, end, vans.len());
    Ok(BulkResponse {
        message: format!("Days added successfully up to {}", end),
        outcome,
    })
}

// =====================
// 週テンプレートの適用
// =====================

async fn plan_template(services: &AppServices, req: &TemplateRequest) -> Result<(Groomer, Vec<grid_logic::TemplateSlot>)> {
    let start = parse_day("start_date", &req.start_date)?;
    let groomer = active_groomer(services, req.groomer_id).await?;

    let end = services
        .schedule
        .last_day(ScheduleBoard::Master)
        .await?
        .ok_or_else(|| AppError::Validation("Schedule is empty. Initialize it first.".to_string()))?;
    let vans = services.registry.list_vans(ScheduleBoard::Master).await?;

    let slots = grid_logic::template_slots(&groomer, &vans, start, end)?;
    Ok((groomer, slots))
}

pub async fn preview_template(services: &AppServices, req: TemplateRequest) -> Result<TemplatePreview> {
    let (groomer, slots) = plan_template(services, &req).await?;
    Ok(TemplatePreview { groomer: groomer.name, slots })
}

pub async fn apply_template(services: &AppServices, user: &AuthUser, req: TemplateRequest) -> Result<BulkResponse> {
    let (groomer, slots) = plan_template(services, &req).await?;
    let now = Utc::now();
    let note = format!("Normal schedule for {} applied by {}", groomer.name, user.username);

    let mutations: Vec<(ScheduleCell, HistoryRecord)> = grid_logic::template_cells(&groomer, &slots)
        .into_iter()
        .map(|cell| {
            let history = HistoryRecord::for_cell(&cell, HistoryAction::Template, note.clone(), &user.username, now);
            (cell, history)
        })
        .collect();

    let outcome = services.schedule.bulk_apply_mutations(&mutations).await.into_result()?;
    tracing::info!("{} ({} cells)", note, outcome.written);
    Ok(BulkResponse {
        message: format!("Normal schedule created for {}", groomer.name),
        outcome,
    })
}

// =====================
// グルーマー予定の削除
// =====================

async fn plan_clear(services: &AppServices, req: &ClearScheduleRequest) -> Result<(Groomer, Vec<ScheduleCell>)> {
    let target = parse_day("target_date", &req.target_date)?;
    let vans = req.vans.to_filter()?;
    let groomer = services
        .registry
        .find_groomer(req.groomer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Groomer {} not found", req.groomer_id)))?;

    let cells = services
        .schedule
        .find_assigned_cells(&groomer.name, target, vans.as_deref())
        .await?;
    Ok((groomer, cells))
}

pub async fn preview_clear(services: &AppServices, req: ClearScheduleRequest) -> Result<Vec<ScheduleCell>> {
    let (_, cells) = plan_clear(services, &req).await?;
    Ok(cells)
}

pub async fn clear_groomer_schedule(
    services: &AppServices,
    user: &AuthUser,
    req: ClearScheduleRequest,
) -> Result<BulkResponse> {
    let (groomer, cells) = plan_clear(services, &req).await?;
    let now = Utc::now();
    let note = format!("Removed {} by {}", groomer.name, user.username);

    let mutations: Vec<(ScheduleCell, HistoryRecord)> = cells
        .iter()
        .map(|cell| {
            let blank = ScheduleCell::blank(cell.van_id, cell.day);
            let history = HistoryRecord::for_cell(&blank, HistoryAction::Cleared, note.clone(), &user.username, now);
            (blank, history)
        })
        .collect();

    let outcome = services.schedule.bulk_apply_mutations(&mutations).await.into_result()?;
    tracing::info!("{} ({} cells)", note, outcome.written);
    Ok(BulkResponse {
        message: format!("Schedule cleared for {}", groomer.name),
        outcome,
    })
}

// =====================
// 履歴
// =====================

/// 履歴の直接追記 (セルには触らない)
pub async fn append_history(
    services: &AppServices,
    user: &AuthUser,
    req: AppendHistoryRequest,
) -> Result<MessageResponse> {
    if [&req.cell_id, &req.date, &req.action, &req.name, &req.status]
        .iter()
        .any(|value| value.trim().is_empty())
    {
        return Err(AppError::Validation(
            "Missing required fields. Expected cell_id, date, action, name, and status.".to_string(),
        ));
    }
    let date = parse_day("date", &req.date)?;

    let record = HistoryRecord {
        id: None,
        cell_id: req.cell_id.trim().to_string(),
        action: req.action.trim().to_string(),
        date,
        timestamp: req.timestamp.unwrap_or_else(Utc::now),
        name: req.name,
        status: req.status.trim().to_string(),
        note: req.note,
        user: req
            .user
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| user.username.clone()),
    };
    let id = services.history.append(&record).await?;
    Ok(MessageResponse::with_id("Cell history recorded successfully", id))
}

pub async fn cell_history(services: &AppServices, cell_id: &str) -> Result<Vec<HistoryRecord>> {
    let id: CellId = cell_id.trim().parse()?;
    services.history.find_by_cell(&id.to_string()).await
}

pub async fn history_report(services: &AppServices, query: HistoryReportQuery) -> Result<Vec<HistoryRecord>> {
    let start = require_day("start_date", query.start_date.as_deref())?;
    let end = require_day("end_date", query.end_date.as_deref())?;
    services.history.report(start, end, query.status.as_deref()).await
}

