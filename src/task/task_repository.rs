use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::task_models::{NewTask, Task, TaskChanges, TaskCounts, TaskFilters, TaskStatus};
use crate::error::Result;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &NewTask) -> Result<Task>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>>;
    /// Newest first.
    async fn find_all(&self, filters: &TaskFilters) -> Result<Vec<Task>>;
    async fn update(&self, id: Uuid, changes: &TaskChanges) -> Result<Option<Task>>;
    /// `completed` stamps `completed_at` and records `actual_time` when given.
    async fn update_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        actual_time: Option<i32>,
    ) -> Result<Option<Task>>;
    async fn delete(&self, id: Uuid) -> Result<u64>;
    /// Flips past-due open tasks to overdue and returns the flipped rows.
    async fn mark_overdue(&self) -> Result<Vec<Task>>;
    async fn counts(&self, assigned_to: Option<Uuid>) -> Result<TaskCounts>;
}

const TASK_SELECT: &str = "SELECT
        t.*,
        u1.name AS assigned_to_name,
        u1.email AS assigned_to_email,
        u2.name AS assigned_by_name,
        u2.email AS assigned_by_email
     FROM tasks t
     LEFT JOIN users u1 ON t.assigned_to = u1.id
     LEFT JOIN users u2 ON t.assigned_by = u2.id";

/// Wraps a data-modifying statement ending in `RETURNING *` so that the
/// joined user columns come back with it.
fn with_user_columns(statement: &str) -> String {
    format!(
        "WITH t AS ({})
         SELECT
            t.*,
            u1.name AS assigned_to_name,
            u1.email AS assigned_to_email,
            u2.name AS assigned_by_name,
            u2.email AS assigned_by_email
         FROM t
         LEFT JOIN users u1 ON t.assigned_to = u1.id
         LEFT JOIN users u2 ON t.assigned_by = u2.id",
        statement
    )
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, task: &NewTask) -> Result<Task> {
        let query = with_user_columns(
            "INSERT INTO tasks (title, description, category, priority, assigned_to, assigned_by, due_date, estimated_time)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.category)
            .bind(task.priority)
            .bind(task.assigned_to)
            .bind(task.assigned_by)
            .bind(task.due_date)
            .bind(task.estimated_time)
            .fetch_one(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>> {
        let query = format!("{} WHERE t.id = $1", TASK_SELECT);

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_all(&self, filters: &TaskFilters) -> Result<Vec<Task>> {
        let mut query = format!("{} WHERE 1=1", TASK_SELECT);
        let mut param_count = 0;

        if filters.assigned_to.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND t.assigned_to = ${}", param_count));
        }
        if filters.status.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND t.status = ${}", param_count));
        }
        if filters.category.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND t.category = ${}", param_count));
        }
        if filters.priority.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND t.priority = ${}", param_count));
        }
        if filters.search.is_some() {
            param_count += 1;
            query.push_str(&format!(
                " AND (t.title ILIKE ${0} ESCAPE '\\' OR t.description ILIKE ${0} ESCAPE '\\')",
                param_count
            ));
        }

        query.push_str(" ORDER BY t.created_at DESC");

        if filters.limit.is_some() {
            param_count += 1;
            query.push_str(&format!(" LIMIT ${}", param_count));
        }

        let mut q = sqlx::query_as::<_, Task>(&query);

        if let Some(assigned_to) = filters.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(status) = filters.status {
            q = q.bind(status);
        }
        if let Some(category) = filters.category {
            q = q.bind(category);
        }
        if let Some(priority) = filters.priority {
            q = q.bind(priority);
        }
        if let Some(search) = &filters.search {
            q = q.bind(contains_pattern(search));
        }
        if let Some(limit) = filters.limit {
            q = q.bind(limit);
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn update(&self, id: Uuid, changes: &TaskChanges) -> Result<Option<Task>> {
        let query = with_user_columns(
            "UPDATE tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                priority = COALESCE($5, priority),
                assigned_to = COALESCE($6, assigned_to),
                due_date = COALESCE($7, due_date),
                estimated_time = COALESCE($8, estimated_time),
                remarks = COALESCE($9, remarks),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(changes.category)
            .bind(changes.priority)
            .bind(changes.assigned_to)
            .bind(changes.due_date)
            .bind(changes.estimated_time)
            .bind(&changes.remarks)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        actual_time: Option<i32>,
    ) -> Result<Option<Task>> {
        let mut statement = String::from("UPDATE tasks SET status = $2, updated_at = NOW()");
        let completed = status == TaskStatus::Completed;

        if completed {
            statement.push_str(", completed_at = NOW()");
            if actual_time.is_some() {
                statement.push_str(", actual_time = $3");
            }
        }
        statement.push_str(" WHERE id = $1 RETURNING *");

        let query = with_user_columns(&statement);
        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(status);
        if completed {
            if let Some(actual_time) = actual_time {
                q = q.bind(actual_time);
            }
        }

        Ok(q.fetch_optional(&self.pool).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn mark_overdue(&self) -> Result<Vec<Task>> {
        let query = with_user_columns(
            "UPDATE tasks SET status = 'overdue', updated_at = NOW()
             WHERE due_date < NOW()
               AND status NOT IN ('completed', 'overdue')
             RETURNING *",
        );

        let flipped = sqlx::query_as::<_, Task>(&query)
            .fetch_all(&self.pool)
            .await?;

        if !flipped.is_empty() {
            tracing::info!("Marked {} tasks as overdue", flipped.len());
        }

        Ok(flipped)
    }

    async fn counts(&self, assigned_to: Option<Uuid>) -> Result<TaskCounts> {
        let mut query = String::from(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'in-progress') AS in_progress,
                COUNT(*) FILTER (
                    WHERE status = 'overdue'
                       OR (due_date < NOW() AND status != 'completed')
                ) AS overdue
             FROM tasks",
        );
        if assigned_to.is_some() {
            query.push_str(" WHERE assigned_to = $1");
        }

        let mut q = sqlx::query_as::<_, TaskCounts>(&query);
        if let Some(user_id) = assigned_to {
            q = q.bind(user_id);
        }

        Ok(q.fetch_one(&self.pool).await?)
    }
}

/// `ILIKE` pattern matching `needle` literally anywhere in the text.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
