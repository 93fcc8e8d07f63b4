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
    dto::ApiResponse,
    error::Result,
    extract::{ApiJson, ApiQuery},
    middleware::AuthUser,
    notification::{
        notification_dto::{CreateNotificationRequest, NotificationListQuery, UnreadCountResponse},
        notification_models::Notification,
    },
    state::AppState,
};

/// Get the caller's notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of notifications (default 50)"),
        ("unreadOnly" = Option<bool>, Query, description = "Only unread notifications"),
        ("type" = Option<String>, Query, description = "Filter by notification type")
    ),
    responses(
        (status = 200, description = "Notifications retrieved successfully", body = [Notification]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<NotificationListQuery>,
) -> Result<Json<ApiResponse<Vec<Notification>>>> {
    let notifications = state
        .notification_service
        .list(auth.id, &query.into())
        .await?;

    Ok(Json(ApiResponse::data(notifications)))
}

/// Count the caller's unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "notifications",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UnreadCountResponse>>> {
    let unread_count = state.notification_service.unread_count(auth.id).await?;

    Ok(Json(ApiResponse::data(UnreadCountResponse { unread_count })))
}

/// Create a notification
#[utoipa::path(
    post,
    path = "/api/notifications",
    tag = "notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created successfully", body = Notification),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Users can only notify themselves")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<CreateNotificationRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let notification = state
        .notification_service
        .create(&auth, payload.into_new(auth.id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Notification created successfully",
            notification,
        )),
    ))
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Notification>>> {
    let notification = state
        .notification_service
        .mark_as_read(auth.id, id, &meta)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Notification marked as read",
        notification,
    )))
}

/// Mark all of the caller's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    tag = "notifications",
    responses(
        (status = 200, description = "All notifications marked as read"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
) -> Result<Json<ApiResponse<()>>> {
    state
        .notification_service
        .mark_all_as_read(auth.id, &meta)
        .await?;

    Ok(Json(ApiResponse::message("All notifications marked as read")))
}

/// Delete one of the caller's notifications
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    state.notification_service.delete(auth.id, id).await?;

    Ok(Json(ApiResponse::message("Notification deleted")))
}
