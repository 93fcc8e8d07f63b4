use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::remark_models::{NewRemark, Remark, RemarkFilters};
use crate::error::Result;

#[async_trait]
pub trait RemarkRepository: Send + Sync {
    async fn create(&self, remark: &NewRemark) -> Result<Remark>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Remark>>;
    /// Newest first.
    async fn find_all(&self, filters: &RemarkFilters) -> Result<Vec<Remark>>;
    async fn respond(&self, id: Uuid, response: &str) -> Result<Option<Remark>>;
    async fn delete(&self, id: Uuid) -> Result<u64>;
}

#[derive(Clone)]
pub struct PgRemarkRepository {
    pool: PgPool,
}

impl PgRemarkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemarkRepository for PgRemarkRepository {
    async fn create(&self, remark: &NewRemark) -> Result<Remark> {
        let remark = sqlx::query_as::<_, Remark>(
            "INSERT INTO remarks (user_id, task_id, message, type)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(remark.user_id)
        .bind(remark.task_id)
        .bind(&remark.message)
        .bind(remark.remark_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(remark)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Remark>> {
        let remark = sqlx::query_as::<_, Remark>("SELECT * FROM remarks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(remark)
    }

    async fn find_all(&self, filters: &RemarkFilters) -> Result<Vec<Remark>> {
        let mut query = String::from("SELECT * FROM remarks WHERE 1=1");
        let mut param_count = 0;

        if filters.user_id.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND user_id = ${}", param_count));
        }
        if filters.task_id.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND task_id = ${}", param_count));
        }
        if filters.remark_type.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND type = ${}", param_count));
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, Remark>(&query);
        if let Some(user_id) = filters.user_id {
            q = q.bind(user_id);
        }
        if let Some(task_id) = filters.task_id {
            q = q.bind(task_id);
        }
        if let Some(remark_type) = filters.remark_type {
            q = q.bind(remark_type);
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn respond(&self, id: Uuid, response: &str) -> Result<Option<Remark>> {
        let remark = sqlx::query_as::<_, Remark>(
            "UPDATE remarks SET admin_response = $2, responded_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(response)
        .fetch_optional(&self.pool)
        .await?;

        Ok(remark)
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM remarks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
