use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::task_models::{Priority, TaskCategory, TaskChanges, TaskStatus};

pub const DEFAULT_TASK_LIMIT: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Uuid>,
    /// Defaults by category: one day, one week or thirty days out.
    pub due_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Estimated time must be a positive integer"))]
    pub estimated_time: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<TaskCategory>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Estimated time must be a positive integer"))]
    pub estimated_time: Option<i32>,
    pub remarks: Option<String>,
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            category: req.category,
            priority: req.priority,
            assigned_to: req.assigned_to,
            due_date: req.due_date,
            estimated_time: req.estimated_time,
            remarks: req.remarks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
    /// Minutes; stored only when completing.
    #[validate(range(min = 0, message = "Actual time cannot be negative"))]
    pub actual_time: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub category: Option<TaskCategory>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl TaskListQuery {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_TASK_LIMIT).clamp(1, 500)
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}
