mod extract;

use axum::Json;
use axum::extract::Path;
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;
use crate::web;
use extract::{JsonBody, TaskId};

#[derive(Debug, Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct AddedResponse {
    ok: bool,
    id: i64,
}

#[derive(Debug, Serialize)]
struct DoneResponse {
    ok: bool,
    is_done: bool,
}

#[derive(Debug, Serialize)]
struct TodayResponse {
    ok: bool,
    is_today: bool,
}

#[derive(Debug, Serialize)]
struct PositionResponse {
    ok: bool,
    position: i64,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    ok: bool,
    deleted: u64,
}

#[derive(Debug, Serialize)]
struct TaskListResponse {
    tasks: Vec<ListedTask>,
}

#[derive(Debug, Serialize)]
struct CategoriesResponse {
    categories: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(web::index))
        .route("/health", get(health))
        .route("/api/task/{id}", get(get_task))
        .route("/api/task/{id}/description", post(update_description))
        .route("/api/task/{id}/title", post(update_title))
        .route("/api/task/{id}/toggle", post(toggle_done))
        .route("/api/task/{id}/today", post(set_today))
        .route("/api/task/{id}/position", post(set_position))
        .route("/api/add", post(add_task))
        .route("/api/delete", post(delete_task))
        .route("/api/list/{name}", get(list_tasks))
        .route("/api/categories", get(list_categories))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn get_task(
    State(state): State<AppState>,
    TaskId(id): TaskId,
) -> Result<Json<TaskDetail>, AppError> {
    let detail = state.tasks.detail(id).await?;
    Ok(Json(detail))
}

async fn update_description(
    State(state): State<AppState>,
    TaskId(id): TaskId,
    JsonBody(req): JsonBody<UpdateDescriptionRequest>,
) -> Result<Json<OkResponse>, AppError> {
    state.tasks.update_description(id, &req.description).await?;
    Ok(Json(OkResponse { ok: true }))
}

async fn update_title(
    State(state): State<AppState>,
    TaskId(id): TaskId,
    JsonBody(req): JsonBody<UpdateTitleRequest>,
) -> Result<Json<OkResponse>, AppError> {
    state.tasks.rename(id, &req.title).await?;
    Ok(Json(OkResponse { ok: true }))
}

async fn toggle_done(
    State(state): State<AppState>,
    TaskId(id): TaskId,
) -> Result<Json<DoneResponse>, AppError> {
    let is_done = state.tasks.toggle_done(id).await?;
    Ok(Json(DoneResponse { ok: true, is_done }))
}

async fn set_today(
    State(state): State<AppState>,
    TaskId(id): TaskId,
    JsonBody(req): JsonBody<SetTodayRequest>,
) -> Result<Json<TodayResponse>, AppError> {
    let is_today = state.tasks.set_today(id, req.is_today).await?;
    Ok(Json(TodayResponse { ok: true, is_today }))
}

async fn set_position(
    State(state): State<AppState>,
    TaskId(id): TaskId,
    JsonBody(req): JsonBody<SetPositionRequest>,
) -> Result<Json<PositionResponse>, AppError> {
    let position = state.tasks.set_position(id, req.position).await?;
    Ok(Json(PositionResponse { ok: true, position }))
}

async fn add_task(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AddTaskRequest>,
) -> Result<Json<AddedResponse>, AppError> {
    let id = state.tasks.add(req).await?;
    Ok(Json(AddedResponse { ok: true, id }))
}

async fn delete_task(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<DeleteTaskRequest>,
) -> Result<Json<DeletedResponse>, AppError> {
    let deleted = state.tasks.delete(req.id).await?;
    Ok(Json(DeletedResponse { ok: true, deleted }))
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<TaskListResponse>, AppError> {
    let tasks = state.tasks.list(&ListFilter::from_name(&name)).await?;
    Ok(Json(TaskListResponse { tasks }))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, AppError> {
    let categories = state.tasks.distinct_categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}
