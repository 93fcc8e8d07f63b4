use std::sync::Arc;

use serde_json::json;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    activity::{ActivityLogger, ActivityType, RequestMeta},
    error::{AppError, Result},
    middleware::AuthUser,
    notification::{
        notification_models::{NewNotification, Notification, NotificationFilters},
        notification_repository::NotificationRepository,
    },
    task::task_repository::TaskRepository,
    websocket::{types::WsMessage, RoomRegistry},
};

#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    rooms: RoomRegistry,
    activity: ActivityLogger,
}

impl NotificationService {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        rooms: RoomRegistry,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            repo,
            rooms,
            activity,
        }
    }

    /// Stores the notification and pushes it to the recipient's room.
    pub async fn deliver(&self, notification: &NewNotification) -> Result<Notification> {
        let created = self.repo.create(notification).await?;
        self.rooms.send_to_user(
            created.user_id,
            WsMessage::NotificationCreated(created.clone()),
        );
        Ok(created)
    }

    /// Users may only notify themselves; admins may target anyone.
    pub async fn create(
        &self,
        caller: &AuthUser,
        mut notification: NewNotification,
    ) -> Result<Notification> {
        if !caller.is_admin() && notification.user_id != caller.id {
            return Err(AppError::Forbidden(
                "You can only create notifications for yourself".to_string(),
            ));
        }
        if notification.metadata.is_null() {
            notification.metadata = json!({});
        }

        self.deliver(&notification).await
    }

    pub async fn list(&self, user_id: Uuid, filters: &NotificationFilters) -> Result<Vec<Notification>> {
        self.repo.find_by_user(user_id, filters).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        self.repo.unread_count(user_id).await
    }

    pub async fn mark_as_read(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: &RequestMeta,
    ) -> Result<Notification> {
        let notification = self
            .repo
            .mark_as_read(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        self.activity
            .log(
                user_id,
                ActivityType::NotificationRead,
                "Marked notification as read",
                json!({ "notificationId": id }),
                request,
            )
            .await;

        Ok(notification)
    }

    pub async fn mark_all_as_read(&self, user_id: Uuid, request: &RequestMeta) -> Result<u64> {
        let updated = self.repo.mark_all_as_read(user_id).await?;

        self.activity
            .log(
                user_id,
                ActivityType::NotificationRead,
                "Marked all notifications as read",
                json!({ "count": updated }),
                request,
            )
            .await;

        Ok(updated)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        if self.repo.delete(id, user_id).await? == 0 {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }

    /// Flips past-due tasks to overdue and tells each assignee once.
    pub async fn sweep_overdue(&self, tasks: &dyn TaskRepository) -> Result<usize> {
        let flipped = tasks.mark_overdue().await?;
        let mut notified = 0;

        for task in &flipped {
            let Some(notification) = NewNotification::task_overdue(task) else {
                continue;
            };
            match self.deliver(&notification).await {
                Ok(_) => notified += 1,
                Err(e) => error!("Failed to notify overdue task {}: {:?}", task.id, e),
            }
        }

        Ok(notified)
    }
}

/// Runs the overdue sweep on the given cron schedule (six fields, seconds first).
pub async fn start_overdue_sweep(
    service: NotificationService,
    tasks: Arc<dyn TaskRepository>,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let service = service.clone();
        let tasks = tasks.clone();

        Box::pin(async move {
            match service.sweep_overdue(tasks.as_ref()).await {
                Ok(0) => {}
                Ok(count) => info!("Overdue sweep notified {} assignees", count),
                Err(e) => error!("Overdue sweep failed: {:?}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Overdue sweep scheduled ({})", schedule);
    Ok(scheduler)
}
