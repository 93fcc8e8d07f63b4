use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::notification_models::{NewNotification, Notification, NotificationFilters};
use crate::error::Result;

/// Every read and write is scoped to the owning user.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &NewNotification) -> Result<Notification>;
    async fn find_by_user(
        &self,
        user_id: Uuid,
        filters: &NotificationFilters,
    ) -> Result<Vec<Notification>>;
    async fn mark_as_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>>;
    async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64>;
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64>;
    async fn unread_count(&self, user_id: Uuid) -> Result<i64>;
}

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: &NewNotification) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (title, message, type, priority, user_id, metadata)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.notification_type)
        .bind(notification.priority)
        .bind(notification.user_id)
        .bind(&notification.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        filters: &NotificationFilters,
    ) -> Result<Vec<Notification>> {
        let mut query = String::from("SELECT * FROM notifications WHERE user_id = $1");
        let mut param_count = 1;

        if filters.unread_only {
            query.push_str(" AND is_read = false");
        }
        if filters.notification_type.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND type = ${}", param_count));
        }
        query.push_str(" ORDER BY created_at DESC");
        if filters.limit.is_some() {
            param_count += 1;
            query.push_str(&format!(" LIMIT ${}", param_count));
        }

        let mut q = sqlx::query_as::<_, Notification>(&query).bind(user_id);
        if let Some(notification_type) = filters.notification_type {
            q = q.bind(notification_type);
        }
        if let Some(limit) = filters.limit {
            q = q.bind(limit);
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn mark_as_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = true
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
