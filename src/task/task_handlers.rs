use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    activity::RequestMeta,
    dto::{ApiResponse, PaginatedResponse},
    error::Result,
    extract::{ApiJson, ApiQuery},
    middleware::AuthUser,
    state::AppState,
    task::{
        task_dto::{CreateTaskRequest, TaskListQuery, UpdateTaskRequest, UpdateTaskStatusRequest},
        task_models::{Task, TaskStats},
    },
};

/// List tasks visible to the caller
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    params(
        ("status" = Option<String>, Query, description = "pending | in-progress | completed | overdue"),
        ("category" = Option<String>, Query, description = "daily | weekly | monthly"),
        ("priority" = Option<String>, Query, description = "low | medium | high"),
        ("search" = Option<String>, Query, description = "Case-insensitive match on title or description"),
        ("assignedTo" = Option<Uuid>, Query, description = "Filter by assignee (admin only)"),
        ("limit" = Option<u32>, Query, description = "Maximum number of tasks (default 50)"),
        ("page" = Option<u32>, Query, description = "Echoed back in the pagination block")
    ),
    responses(
        (status = 200, description = "Tasks retrieved successfully", body = [Task]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<TaskListQuery>,
) -> Result<Json<PaginatedResponse<Task>>> {
    let tasks = state.task_service.list(&auth, &query).await?;

    Ok(Json(PaginatedResponse::new(tasks, query.page(), query.limit())))
}

/// Get a specific task by ID
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task retrieved successfully", body = Task),
        (status = 403, description = "Not assigned to or created by the caller"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Task>>> {
    let task = state.task_service.get(&auth, id).await?;

    Ok(Json(ApiResponse::data(task)))
}

/// Create a new task
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created successfully", body = Task),
        (status = 400, description = "Validation error or unknown assignee"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let task = state.task_service.create(&auth, payload, &meta).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Task created successfully", task)),
    ))
}

/// Update a task
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated successfully", body = Task),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> Result<Json<ApiResponse<Task>>> {
    payload.validate()?;

    let task = state
        .task_service
        .update(&auth, id, payload.into(), &meta)
        .await?;

    Ok(Json(ApiResponse::with_message("Task updated successfully", task)))
}

/// Change a task's status
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}/status",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskStatusRequest,
    responses(
        (status = 200, description = "Task status updated successfully", body = Task),
        (status = 403, description = "Only the assignee or an admin may change status"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_task_status(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateTaskStatusRequest>,
) -> Result<Json<ApiResponse<Task>>> {
    payload.validate()?;

    let task = state
        .task_service
        .update_status(&auth, id, payload.status, payload.actual_time, &meta)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Task status updated successfully",
        task,
    )))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted successfully"),
        (status = 403, description = "Only the creator or an admin may delete"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    state.task_service.delete(&auth, id, &meta).await?;

    Ok(Json(ApiResponse::message("Task deleted successfully")))
}

/// Dashboard statistics
#[utoipa::path(
    get,
    path = "/api/tasks/stats",
    tag = "tasks",
    responses(
        (status = 200, description = "Task statistics", body = TaskStats),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_task_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
) -> Result<Json<ApiResponse<TaskStats>>> {
    let stats = state.task_service.stats(&auth, &meta).await?;

    Ok(Json(ApiResponse::data(stats)))
}
