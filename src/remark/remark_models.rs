use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RemarkType {
    #[default]
    Feedback,
    Issue,
    Suggestion,
}

wire_enum!(RemarkType, "remark type", {
    Feedback => "feedback",
    Issue => "issue",
    Suggestion => "suggestion",
});

/// Free-form feedback from a user, optionally about a task, with an
/// optional admin reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub message: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub remark_type: RemarkType,
    pub admin_response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRemark {
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub message: String,
    pub remark_type: RemarkType,
}

#[derive(Debug, Clone, Default)]
pub struct RemarkFilters {
    pub user_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub remark_type: Option<RemarkType>,
}

impl RemarkFilters {
    pub fn matches(&self, remark: &Remark) -> bool {
        self.user_id.map_or(true, |id| id == remark.user_id)
            && self.task_id.map_or(true, |id| Some(id) == remark.task_id)
            && self.remark_type.map_or(true, |t| t == remark.remark_type)
    }
}
