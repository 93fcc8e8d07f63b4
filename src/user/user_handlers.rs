use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    activity::RequestMeta,
    dto::ApiResponse,
    error::Result,
    extract::{ApiJson, ApiQuery},
    middleware::AuthUser,
    state::AppState,
    user::{
        user_dto::{AdminUpdateUserRequest, ListUsersQuery},
        user_models::{Role, UserResponse},
    },
};

// Admin endpoints

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(
        ("role" = Option<Role>, Query, description = "Filter by role")
    ),
    responses(
        (status = 200, description = "Users retrieved successfully", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>> {
    let users = state.user_service.list(query.role).await?;

    Ok(Json(ApiResponse::data(
        users.into_iter().map(UserResponse::from).collect(),
    )))
}

/// Get a user by ID (admin only)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = state.user_service.get(id).await?;

    Ok(Json(ApiResponse::data(user.into())))
}

/// Update a user's profile (admin only)
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    admin: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<AdminUpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    payload.validate()?;

    let user = state
        .user_service
        .update(admin.id, id, payload.into(), &meta)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "User updated successfully",
        user.into(),
    )))
}

/// Deactivate a user (admin only)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deactivated successfully"),
        (status = 400, description = "Cannot deactivate own account"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    admin: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    state.user_service.deactivate(admin.id, id, &meta).await?;

    Ok(Json(ApiResponse::message("User deactivated successfully")))
}
