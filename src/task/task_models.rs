use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Daily,
    Weekly,
    Monthly,
}

wire_enum!(TaskCategory, "task category", {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
});

impl TaskCategory {
    /// Due date used when a task is created without one.
    pub fn default_due_date(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let days = match self {
            TaskCategory::Daily => 1,
            TaskCategory::Weekly => 7,
            TaskCategory::Monthly => 30,
        };
        from + Duration::days(days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Overdue,
}

wire_enum!(TaskStatus, "task status", {
    Pending => "pending",
    InProgress => "in-progress",
    Completed => "completed",
    Overdue => "overdue",
});

/// Shared by tasks and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

wire_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    /// Minutes.
    pub estimated_time: Option<i32>,
    /// Minutes.
    pub actual_time: Option<i32>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_to_name: Option<String>,
    pub assigned_to_email: Option<String>,
    pub assigned_by_name: Option<String>,
    pub assigned_by_email: Option<String>,
}

impl Task {
    /// True when the overdue sweep would flip this task at `now`.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::InProgress)
            && self.due_date.map_or(false, |due| due < now)
    }

    /// Counted as overdue by the stats even before the sweep has run.
    pub fn counts_as_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Overdue
            || (self.status != TaskStatus::Completed
                && self.due_date.map_or(false, |due| due < now))
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.assigned_to == Some(user_id) || self.assigned_by == Some(user_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub priority: Priority,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Uuid,
    pub due_date: DateTime<Utc>,
    pub estimated_time: Option<i32>,
}

/// Partial task update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        *self == TaskChanges::default()
    }

    /// Stored values of `task` for exactly the fields this update touches.
    pub fn before(&self, task: &Task) -> Value {
        let touched = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return Value::Object(Map::new()),
        };
        let current = match serde_json::to_value(task) {
            Ok(Value::Object(map)) => map,
            _ => return Value::Object(Map::new()),
        };

        let before: Map<String, Value> = touched
            .keys()
            .map(|key| (key.clone(), current.get(key).cloned().unwrap_or(Value::Null)))
            .collect();

        Value::Object(before)
    }

    /// Applies the update in place, as the repository's `COALESCE` does.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = Some(assigned_to);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(estimated_time) = self.estimated_time {
            task.estimated_time = Some(estimated_time);
        }
        if let Some(remarks) = &self.remarks {
            task.remarks = Some(remarks.clone());
        }
    }
}

/// Conjunctive filters; `None` fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub assigned_to: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub category: Option<TaskCategory>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub limit: Option<i64>,
}

impl TaskFilters {
    /// Same predicate as the SQL listing, for in-memory collections.
    pub fn matches(&self, task: &Task) -> bool {
        if self.assigned_to.is_some() && task.assigned_to != self.assigned_to {
            return false;
        }
        if self.status.map_or(false, |s| s != task.status) {
            return false;
        }
        if self.category.map_or(false, |c| c != task.category) {
            return false;
        }
        if self.priority.map_or(false, |p| p != task.priority) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_description = task
                .description
                .as_deref()
                .map_or(false, |d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub overdue: i64,
}

impl TaskCounts {
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut counts, task| {
            counts.total += 1;
            match task.status {
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Overdue => {}
            }
            if task.counts_as_overdue_at(now) {
                counts.overdue += 1;
            }
            counts
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub overdue_tasks: i64,
    pub compliance_rate: i64,
}

impl From<TaskCounts> for TaskStats {
    fn from(counts: TaskCounts) -> Self {
        Self {
            total_tasks: counts.total,
            completed_tasks: counts.completed,
            pending_tasks: counts.pending,
            in_progress_tasks: counts.in_progress,
            overdue_tasks: counts.overdue,
            compliance_rate: compliance_rate(counts.completed, counts.total),
        }
    }
}

/// Percentage of completed tasks, rounded half up; 0 for an empty scope.
pub fn compliance_rate(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (completed * 200 + total) / (2 * total)
}
