use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{middleware, Extension, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::auth::{require_admin, require_auth, AuthUser};
use crate::application::commands;
use crate::application::dto::*;
use crate::domain::models::{GroomerId, HistoryRecord, ScheduleBoard, ScheduleCell, VanId};
use crate::domain::registry_model::{Groomer, Van};
use crate::error::Result;
use crate::AppServices;

type Services = State<Arc<AppServices>>;

/// API 全体のルーター
///
/// - `/health`, `/register`, `/login` は認証なし
/// - `/event-history` はログインしていれば誰でも
/// - それ以外は admin のみ
pub fn router(services: Arc<AppServices>) -> Router {
    let admin = Router::new()
        .route("/vans", get(list_vans).post(add_van))
        .route("/vans/{id}", put(update_van).delete(delete_van))
        .route("/groomers", get(list_groomers).post(add_groomer))
        .route("/groomers/{id}", put(update_groomer).delete(delete_groomer))
        .route("/schedule", get(list_schedule).put(save_schedule))
        .route("/schedule/grid", get(schedule_grid))
        .route("/schedule/cell", put(edit_cell))
        .route("/schedule/drag-copy", post(drag_copy))
        .route("/initialize-schedule", post(initialize_schedule))
        .route("/add-days", post(add_days))
        .route("/create-groomer-normal-schedule", post(apply_template))
        .route("/create-groomer-normal-schedule-preview", post(preview_template))
        .route("/delete-groomer-schedule", post(clear_groomer_schedule))
        .route("/delete-groomer-schedule-preview", post(preview_clear))
        .route("/cell-history", post(append_history))
        .route("/cell-history/{cell_id}", get(cell_history))
        .route("/model-schedule", get(list_model_schedule).put(save_model_schedule))
        .route("/model-schedule/grid", get(model_grid))
        .route("/model-vans", get(list_model_vans))
        .route("/model-groomers", get(list_model_groomers))
        .route_layer(middleware::from_fn(require_admin));

    let authenticated = Router::new()
        .route("/event-history", get(history_report))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(services.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(services)
}

async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::new("ok"))
}

// --- Auth ---
async fn register(State(services): Services, ApiJson(req): ApiJson<RegisterRequest>) -> Result<Json<MessageResponse>> {
    Ok(Json(commands::register(&services, req).await?))
}

async fn login(State(services): Services, ApiJson(req): ApiJson<LoginRequest>) -> Result<Json<TokenResponse>> {
    Ok(Json(commands::login(&services, req).await?))
}

// --- Vans ---
async fn list_vans(State(services): Services) -> Result<Json<Vec<Van>>> {
    Ok(Json(commands::list_vans(&services, ScheduleBoard::Master).await?))
}

async fn add_van(State(services): Services, ApiJson(req): ApiJson<VanRequest>) -> Result<Json<MessageResponse>> {
    Ok(Json(commands::add_van(&services, req).await?))
}

async fn update_van(
    State(services): Services,
    Path(id): Path<VanId>,
    ApiJson(req): ApiJson<VanRequest>,
) -> Result<Json<MessageResponse>> {
    Ok(Json(commands::update_van(&services, id, req).await?))
}

async fn delete_van(State(services): Services, Path(id): Path<VanId>) -> Result<Json<MessageResponse>> {
    Ok(Json(commands::delete_van(&services, id).await?))
}

// --- Groomers ---
async fn list_groomers(State(services): Services) -> Result<Json<Vec<Groomer>>> {
    Ok(Json(commands::list_groomers(&services, ScheduleBoard::Master).await?))
}

async fn add_groomer(State(services): Services, ApiJson(req): ApiJson<GroomerRequest>) -> Result<Json<MessageResponse>> {
    Ok(Json(commands::add_groomer(&services, req).await?))
}

async fn update_groomer(
    State(services): Services,
    Path(id): Path<GroomerId>,
    ApiJson(req): ApiJson<GroomerRequest>,
) -> Result<Json<MessageResponse>> {
    Ok(Json(commands::update_groomer(&services, id, req).await?))
}

async fn delete_groomer(State(services): Services, Path(id): Path<GroomerId>) -> Result<Json<MessageResponse>> {
    Ok(Json(commands::delete_groomer(&services, id).await?))
}

// --- Schedule ---
async fn list_schedule(State(services): Services) -> Result<Json<Vec<ScheduleCell>>> {
    Ok(Json(commands::list_cells(&services, ScheduleBoard::Master).await?))
}

async fn save_schedule(
    State(services): Services,
    ApiJson(cells): ApiJson<Vec<ScheduleCell>>,
) -> Result<Json<BulkResponse>> {
    Ok(Json(commands::bulk_save(&services, ScheduleBoard::Master, cells).await?))
}

async fn schedule_grid(State(services): Services) -> Result<Json<GridView>> {
    Ok(Json(commands::grid_view(&services, ScheduleBoard::Master).await?))
}

async fn edit_cell(
    State(services): Services,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<EditCellRequest>,
) -> Result<Json<MutationResponse>> {
    Ok(Json(commands::edit_cell(&services, &user, req).await?))
}

async fn drag_copy(
    State(services): Services,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<DragCopyRequest>,
) -> Result<Json<MutationResponse>> {
    Ok(Json(commands::drag_copy(&services, &user, req).await?))
}

async fn initialize_schedule(
    State(services): Services,
    ApiJson(req): ApiJson<InitializeRequest>,
) -> Result<Json<BulkResponse>> {
    Ok(Json(commands::initialize_grid(&services, req).await?))
}

async fn add_days(State(services): Services, ApiJson(req): ApiJson<AddDaysRequest>) -> Result<Json<BulkResponse>> {
    Ok(Json(commands::add_days(&services, req).await?))
}

// --- Utilities ---
async fn preview_template(
    State(services): Services,
    ApiJson(req): ApiJson<TemplateRequest>,
) -> Result<Json<TemplatePreview>> {
    Ok(Json(commands::preview_template(&services, req).await?))
}

async fn apply_template(
    State(services): Services,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<TemplateRequest>,
) -> Result<Json<BulkResponse>> {
    Ok(Json(commands::apply_template(&services, &user, req).await?))
}

async fn preview_clear(
    State(services): Services,
    ApiJson(req): ApiJson<ClearScheduleRequest>,
) -> Result<Json<Vec<ScheduleCell>>> {
    Ok(Json(commands::preview_clear(&services, req).await?))
}

async fn clear_groomer_schedule(
    State(services): Services,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<ClearScheduleRequest>,
) -> Result<Json<BulkResponse>> {
    Ok(Json(commands::clear_groomer_schedule(&services, &user, req).await?))
}

// --- History ---
async fn append_history(
    State(services): Services,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<AppendHistoryRequest>,
) -> Result<Json<MessageResponse>> {
    Ok(Json(commands::append_history(&services, &user, req).await?))
}

async fn cell_history(State(services): Services, Path(cell_id): Path<String>) -> Result<Json<Vec<HistoryRecord>>> {
    Ok(Json(commands::cell_history(&services, &cell_id).await?))
}

async fn history_report(
    State(services): Services,
    Query(query): Query<HistoryReportQuery>,
) -> Result<Json<Vec<HistoryRecord>>> {
    Ok(Json(commands::history_report(&services, query).await?))
}

// --- Modeling board ---
async fn list_model_schedule(State(services): Services) -> Result<Json<Vec<ScheduleCell>>> {
    Ok(Json(commands::list_cells(&services, ScheduleBoard::Model).await?))
}

async fn save_model_schedule(
    State(services): Services,
    ApiJson(cells): ApiJson<Vec<ScheduleCell>>,
) -> Result<Json<BulkResponse>> {
    Ok(Json(commands::bulk_save(&services, ScheduleBoard::Model, cells).await?))
}

async fn model_grid(State(services): Services) -> Result<Json<GridView>> {
    Ok(Json(commands::grid_view(&services, ScheduleBoard::Model).await?))
}

async fn list_model_vans(State(services): Services) -> Result<Json<Vec<Van>>> {
    Ok(Json(commands::list_vans(&services, ScheduleBoard::Model).await?))
}

async fn list_model_groomers(State(services): Services) -> Result<Json<Vec<Groomer>>> {
    Ok(Json(commands::list_groomers(&services, ScheduleBoard::Model).await?))
}
