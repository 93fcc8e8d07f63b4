use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Login,
    Logout,
    UserRegistered,
    ProfileUpdated,
    PasswordChanged,
    UserDeactivated,
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskAssigned,
    TaskDeleted,
    NotificationRead,
    RemarkAdded,
    DashboardViewed,
}

wire_enum!(ActivityType, "activity type", {
    Login => "login",
    Logout => "logout",
    UserRegistered => "user_registered",
    ProfileUpdated => "profile_updated",
    PasswordChanged => "password_changed",
    UserDeactivated => "user_deactivated",
    TaskCreated => "task_created",
    TaskUpdated => "task_updated",
    TaskCompleted => "task_completed",
    TaskAssigned => "task_assigned",
    TaskDeleted => "task_deleted",
    NotificationRead => "notification_read",
    RemarkAdded => "remark_added",
    DashboardViewed => "dashboard_viewed",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub activity_type: ActivityType,
    pub description: String,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Origin of the request that triggered an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub description: String,
    pub metadata: Value,
    pub request: RequestMeta,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityFilters {
    pub user_id: Option<Uuid>,
    pub activity_type: Option<ActivityType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStat {
    pub activity_type: ActivityType,
    pub date: NaiveDate,
    pub count: i64,
}
