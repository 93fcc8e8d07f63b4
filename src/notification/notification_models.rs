use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::wire_enum;
use crate::task::task_models::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    TaskAssigned,
    TaskReminder,
    TaskOverdue,
    #[default]
    SystemAlert,
}

wire_enum!(NotificationType, "notification type", {
    TaskAssigned => "task-assigned",
    TaskReminder => "task-reminder",
    TaskOverdue => "task-overdue",
    SystemAlert => "system-alert",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub user_id: Uuid,
    pub is_read: bool,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub user_id: Uuid,
    pub metadata: Value,
}

fn task_metadata(task: &Task) -> Value {
    json!({
        "taskId": task.id,
        "taskTitle": task.title,
        "dueDate": task.due_date,
    })
}

impl NewNotification {
    pub fn task_assigned(task: &Task, assignee: Uuid) -> Self {
        Self {
            title: "New Task Assigned".to_string(),
            message: format!(
                "You have been assigned a new {} task: {}",
                task.category, task.title
            ),
            notification_type: NotificationType::TaskAssigned,
            priority: task.priority,
            user_id: assignee,
            metadata: task_metadata(task),
        }
    }

    /// `None` for unassigned tasks.
    pub fn task_reminder(task: &Task) -> Option<Self> {
        let assignee = task.assigned_to?;
        Some(Self {
            title: "Task Reminder".to_string(),
            message: format!("Reminder: Task \"{}\" is due soon", task.title),
            notification_type: NotificationType::TaskReminder,
            priority: Priority::Medium,
            user_id: assignee,
            metadata: task_metadata(task),
        })
    }

    /// `None` for unassigned tasks.
    pub fn task_overdue(task: &Task) -> Option<Self> {
        let assignee = task.assigned_to?;
        Some(Self {
            title: "Task Overdue".to_string(),
            message: format!("Task \"{}\" is now overdue", task.title),
            notification_type: NotificationType::TaskOverdue,
            priority: Priority::High,
            user_id: assignee,
            metadata: task_metadata(task),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationFilters {
    pub unread_only: bool,
    pub notification_type: Option<NotificationType>,
    pub limit: Option<i64>,
}

impl NotificationFilters {
    pub fn matches(&self, notification: &Notification) -> bool {
        if self.unread_only && notification.is_read {
            return false;
        }
        self.notification_type
            .map_or(true, |t| t == notification.notification_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_task;

    #[test]
    fn test_assigned_notification_content() {
        let mut task = sample_task("Inspect fire pumps");
        task.priority = Priority::High;
        let assignee = Uuid::new_v4();

        let n = NewNotification::task_assigned(&task, assignee);
        assert_eq!(n.notification_type, NotificationType::TaskAssigned);
        assert_eq!(n.user_id, assignee);
        assert_eq!(n.priority, Priority::High);
        assert_eq!(
            n.message,
            "You have been assigned a new daily task: Inspect fire pumps"
        );
        assert_eq!(n.metadata["taskId"], json!(task.id));
    }

    #[test]
    fn test_reminder_and_overdue_need_an_assignee() {
        let mut task = sample_task("Unassigned");
        task.assigned_to = None;
        assert!(NewNotification::task_reminder(&task).is_none());
        assert!(NewNotification::task_overdue(&task).is_none());

        let assignee = Uuid::new_v4();
        task.assigned_to = Some(assignee);
        let overdue = NewNotification::task_overdue(&task).unwrap();
        assert_eq!(overdue.priority, Priority::High);
        assert_eq!(overdue.user_id, assignee);
        assert_eq!(
            NewNotification::task_reminder(&task).unwrap().notification_type,
            NotificationType::TaskReminder
        );
    }

    #[test]
    fn test_notification_serializes_type_field() {
        let n = Notification {
            id: Uuid::new_v4(),
            title: "Welcome".into(),
            message: "Hello".into(),
            notification_type: NotificationType::SystemAlert,
            priority: Priority::Low,
            user_id: Uuid::new_v4(),
            is_read: false,
            metadata: json!({}),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "system-alert");
        assert_eq!(value["isRead"], false);
    }
}
