use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notification::notification_models::Notification;
use crate::task::task_models::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskAction {
    Created,
    Updated,
    StatusChanged,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdatedPayload {
    pub task_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub updated_by: Uuid,
    pub action: TaskAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Absent once the task has been deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
}

impl TaskUpdatedPayload {
    pub fn new(task: &Task, updated_by: Uuid, action: TaskAction) -> Self {
        Self {
            task_id: task.id,
            assigned_to: task.assigned_to,
            updated_by,
            action,
            status: Some(task.status),
            task: (action != TaskAction::Deleted).then(|| task.clone()),
        }
    }

    /// The assignee is told only about changes made by someone else.
    pub fn recipient(&self) -> Option<Uuid> {
        self.assigned_to.filter(|assignee| *assignee != self.updated_by)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum WsMessage {
    TaskUpdated(TaskUpdatedPayload),
    NotificationCreated(Notification),
    Error(ErrorPayload),
}

/// Frames accepted from clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinUserRoom(JoinRoomPayload),
    TaskUpdated(TaskUpdatedPayload),
    NotificationCreated(Notification),
}
