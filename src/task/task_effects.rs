use serde_json::json;
use uuid::Uuid;

use super::task_models::{Task, TaskChanges, TaskStatus};
use crate::{
    activity::{ActivityLogger, ActivityType, RequestMeta},
    notification::{notification_models::NewNotification, NotificationService},
    websocket::{
        types::{TaskAction, TaskUpdatedPayload, WsMessage},
        RoomRegistry,
    },
};

/// Follow-up work after a task write has succeeded: audit entries,
/// assignment notifications and realtime pushes. Each step is best effort
/// and never fails the write it follows.
#[derive(Clone)]
pub struct TaskEffects {
    activity: ActivityLogger,
    notifications: NotificationService,
    rooms: RoomRegistry,
}

impl TaskEffects {
    pub fn new(
        activity: ActivityLogger,
        notifications: NotificationService,
        rooms: RoomRegistry,
    ) -> Self {
        Self {
            activity,
            notifications,
            rooms,
        }
    }

    pub async fn created(&self, task: &Task, actor: Uuid, request: &RequestMeta) {
        self.activity
            .log(
                actor,
                ActivityType::TaskCreated,
                format!("Created task: {}", task.title),
                json!({
                    "taskId": task.id,
                    "category": task.category,
                    "priority": task.priority,
                }),
                request,
            )
            .await;

        if let Some(assignee) = task.assigned_to.filter(|a| *a != actor) {
            self.assigned(task, assignee, actor, request).await;
        }

        self.push(task, actor, TaskAction::Created);
    }

    pub async fn updated(
        &self,
        previous: &Task,
        task: &Task,
        changes: &TaskChanges,
        actor: Uuid,
        request: &RequestMeta,
    ) {
        self.activity
            .log(
                actor,
                ActivityType::TaskUpdated,
                format!("Updated task: {}", task.title),
                json!({
                    "taskId": task.id,
                    "before": changes.before(previous),
                    "after": changes,
                }),
                request,
            )
            .await;

        let reassigned = task
            .assigned_to
            .filter(|a| previous.assigned_to != Some(*a) && *a != actor);
        if let Some(assignee) = reassigned {
            self.assigned(task, assignee, actor, request).await;
        }

        self.push(task, actor, TaskAction::Updated);
    }

    pub async fn status_changed(
        &self,
        old_status: TaskStatus,
        task: &Task,
        actual_time: Option<i32>,
        actor: Uuid,
        request: &RequestMeta,
    ) {
        let activity_type = if task.status == TaskStatus::Completed {
            ActivityType::TaskCompleted
        } else {
            ActivityType::TaskUpdated
        };

        self.activity
            .log(
                actor,
                activity_type,
                format!("Changed task status to {}: {}", task.status, task.title),
                json!({
                    "taskId": task.id,
                    "oldStatus": old_status,
                    "newStatus": task.status,
                    "actualTime": actual_time,
                }),
                request,
            )
            .await;

        self.push(task, actor, TaskAction::StatusChanged);
    }

    pub async fn deleted(&self, task: &Task, actor: Uuid, request: &RequestMeta) {
        self.activity
            .log(
                actor,
                ActivityType::TaskDeleted,
                format!("Deleted task: {}", task.title),
                json!({ "taskId": task.id, "title": task.title }),
                request,
            )
            .await;

        self.push(task, actor, TaskAction::Deleted);
    }

    async fn assigned(&self, task: &Task, assignee: Uuid, actor: Uuid, request: &RequestMeta) {
        self.activity
            .log(
                actor,
                ActivityType::TaskAssigned,
                format!("Assigned task: {}", task.title),
                json!({ "taskId": task.id, "assignedTo": assignee }),
                request,
            )
            .await;

        let notification = NewNotification::task_assigned(task, assignee);
        if let Err(e) = self.notifications.deliver(&notification).await {
            tracing::error!(
                "Failed to create assignment notification for task {}: {:?}",
                task.id,
                e
            );
        }
    }

    fn push(&self, task: &Task, actor: Uuid, action: TaskAction) {
        let payload = TaskUpdatedPayload::new(task, actor, action);
        if let Some(recipient) = payload.recipient() {
            self.rooms
                .send_to_user(recipient, WsMessage::TaskUpdated(payload));
        }
    }
}
