use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::activity_models::{Activity, ActivityFilters, ActivityStat, NewActivity};
use crate::error::Result;

/// Append-only: activities are never updated or deleted.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn record(&self, activity: &NewActivity) -> Result<()>;
    async fn find_all(&self, filters: &ActivityFilters) -> Result<Vec<Activity>>;
    async fn stats(&self, user_id: Option<Uuid>) -> Result<Vec<ActivityStat>>;
}

#[derive(Clone)]
pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn record(&self, activity: &NewActivity) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_activities (user_id, activity_type, description, metadata, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(activity.user_id)
        .bind(activity.activity_type)
        .bind(&activity.description)
        .bind(&activity.metadata)
        .bind(&activity.request.ip_address)
        .bind(&activity.request.user_agent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_all(&self, filters: &ActivityFilters) -> Result<Vec<Activity>> {
        let mut query = String::from(
            "SELECT ua.*, u.name AS user_name, u.email AS user_email
             FROM user_activities ua
             LEFT JOIN users u ON ua.user_id = u.id
             WHERE 1=1",
        );
        let mut param_count = 0;

        if filters.user_id.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND ua.user_id = ${}", param_count));
        }
        if filters.activity_type.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND ua.activity_type = ${}", param_count));
        }
        if filters.start_date.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND ua.created_at >= ${}", param_count));
        }
        if filters.end_date.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND ua.created_at <= ${}", param_count));
        }

        query.push_str(" ORDER BY ua.created_at DESC");

        if filters.limit.is_some() {
            param_count += 1;
            query.push_str(&format!(" LIMIT ${}", param_count));
        }

        let mut q = sqlx::query_as::<_, Activity>(&query);
        if let Some(user_id) = filters.user_id {
            q = q.bind(user_id);
        }
        if let Some(activity_type) = filters.activity_type {
            q = q.bind(activity_type);
        }
        if let Some(start) = filters.start_date {
            q = q.bind(start);
        }
        if let Some(end) = filters.end_date {
            q = q.bind(end);
        }
        if let Some(limit) = filters.limit {
            q = q.bind(limit);
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn stats(&self, user_id: Option<Uuid>) -> Result<Vec<ActivityStat>> {
        let mut query = String::from(
            "SELECT activity_type, DATE(created_at) AS date, COUNT(*) AS count
             FROM user_activities",
        );
        if user_id.is_some() {
            query.push_str(" WHERE user_id = $1");
        }
        query.push_str(" GROUP BY activity_type, DATE(created_at) ORDER BY date DESC, count DESC");

        let mut q = sqlx::query_as::<_, ActivityStat>(&query);
        if let Some(user_id) = user_id {
            q = q.bind(user_id);
        }

        Ok(q.fetch_all(&self.pool).await?)
    }
}
