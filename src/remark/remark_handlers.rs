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
    remark::{
        remark_dto::{CreateRemarkRequest, RemarkListQuery, RespondRemarkRequest},
        remark_models::Remark,
    },
    state::AppState,
};

/// List remarks
#[utoipa::path(
    get,
    path = "/api/remarks",
    tag = "remarks",
    params(
        ("userId" = Option<Uuid>, Query, description = "Filter by author (admin only)"),
        ("taskId" = Option<Uuid>, Query, description = "Filter by task"),
        ("type" = Option<String>, Query, description = "feedback | issue | suggestion")
    ),
    responses(
        (status = 200, description = "Remarks retrieved successfully", body = [Remark]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_remarks(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<RemarkListQuery>,
) -> Result<Json<ApiResponse<Vec<Remark>>>> {
    let remarks = state.remark_service.list(&auth, query).await?;

    Ok(Json(ApiResponse::data(remarks)))
}

/// Add a remark
#[utoipa::path(
    post,
    path = "/api/remarks",
    tag = "remarks",
    request_body = CreateRemarkRequest,
    responses(
        (status = 201, description = "Remark added successfully", body = Remark),
        (status = 400, description = "Validation error or unknown task")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_remark(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
    ApiJson(payload): ApiJson<CreateRemarkRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let remark = state.remark_service.add(&auth, payload, &meta).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Remark added successfully", remark)),
    ))
}

/// Respond to a remark (admin only)
#[utoipa::path(
    patch,
    path = "/api/remarks/{id}/respond",
    tag = "remarks",
    params(("id" = Uuid, Path, description = "Remark ID")),
    request_body = RespondRemarkRequest,
    responses(
        (status = 200, description = "Response saved", body = Remark),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "Remark not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn respond_to_remark(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<RespondRemarkRequest>,
) -> Result<Json<ApiResponse<Remark>>> {
    payload.validate()?;

    let remark = state.remark_service.respond(id, &payload.response).await?;

    Ok(Json(ApiResponse::with_message("Response saved", remark)))
}

/// Delete a remark
#[utoipa::path(
    delete,
    path = "/api/remarks/{id}",
    tag = "remarks",
    params(("id" = Uuid, Path, description = "Remark ID")),
    responses(
        (status = 200, description = "Remark deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Remark not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_remark(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    state.remark_service.delete(&auth, id).await?;

    Ok(Json(ApiResponse::message("Remark deleted")))
}
