use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::activity_models::{Activity, ActivityFilters, ActivityStat, ActivityType};
use crate::{
    dto::ApiResponse, error::Result, extract::ApiQuery, middleware::AuthUser, state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub limit: Option<i64>,
    pub activity_type: Option<ActivityType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub user_id: Option<Uuid>,
}

/// Non-admins only ever see their own entries; admins may narrow by user.
fn scoped_user(auth: &AuthUser, requested: Option<Uuid>) -> Option<Uuid> {
    if auth.is_admin() {
        requested
    } else {
        Some(auth.id)
    }
}

/// List activity log entries
#[utoipa::path(
    get,
    path = "/api/activities",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of entries (default 50)"),
        ("activityType" = Option<ActivityType>, Query, description = "Filter by activity type"),
        ("startDate" = Option<String>, Query, description = "Earliest timestamp (RFC 3339)"),
        ("endDate" = Option<String>, Query, description = "Latest timestamp (RFC 3339)"),
        ("userId" = Option<Uuid>, Query, description = "Filter by user (admin only)")
    ),
    responses(
        (status = 200, description = "Activity entries", body = [Activity]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "activities",
    security(("bearer_auth" = []))
)]
pub async fn get_activities(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<Activity>>>> {
    let filters = ActivityFilters {
        user_id: scoped_user(&auth, query.user_id),
        activity_type: query.activity_type,
        start_date: query.start_date,
        end_date: query.end_date,
        limit: Some(query.limit.unwrap_or(50).clamp(1, 500)),
    };

    let activities = state.repos.activities.find_all(&filters).await?;

    Ok(Json(ApiResponse::data(activities)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStatsQuery {
    pub user_id: Option<Uuid>,
}

/// Activity counts per type and day
#[utoipa::path(
    get,
    path = "/api/activities/stats",
    params(
        ("userId" = Option<Uuid>, Query, description = "Filter by user (admin only)")
    ),
    responses(
        (status = 200, description = "Activity statistics", body = [ActivityStat]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "activities",
    security(("bearer_auth" = []))
)]
pub async fn get_activity_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ActivityStatsQuery>,
) -> Result<Json<ApiResponse<Vec<ActivityStat>>>> {
    let stats = state
        .repos
        .activities
        .stats(scoped_user(&auth, query.user_id))
        .await?;

    Ok(Json(ApiResponse::data(stats)))
}
