use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    activity::{ActivityLogger, ActivityType, RequestMeta},
    error::{AppError, Result},
    middleware::AuthUser,
    task::{
        task_dto::{CreateTaskRequest, TaskListQuery},
        task_effects::TaskEffects,
        task_models::{NewTask, Task, TaskChanges, TaskFilters, TaskStats, TaskStatus},
        task_repository::TaskRepository,
    },
    user::user_repository::UserRepository,
};

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    effects: TaskEffects,
    activity: ActivityLogger,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        effects: TaskEffects,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            tasks,
            users,
            effects,
            activity,
        }
    }

    /// Regular users only ever see tasks assigned to them.
    pub async fn list(&self, caller: &AuthUser, query: &TaskListQuery) -> Result<Vec<Task>> {
        let assigned_to = if caller.is_admin() {
            query.assigned_to
        } else {
            Some(caller.id)
        };

        let filters = TaskFilters {
            assigned_to,
            status: query.status,
            category: query.category,
            priority: query.priority,
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            limit: Some(i64::from(query.limit())),
        };

        self.tasks.find_all(&filters).await
    }

    async fn find(&self, id: Uuid) -> Result<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
    }

    pub async fn get(&self, caller: &AuthUser, id: Uuid) -> Result<Task> {
        let task = self.find(id).await?;
        if !caller.is_admin() && !task.involves(caller.id) {
            return Err(AppError::Forbidden(
                "You don't have permission to view this task".to_string(),
            ));
        }
        Ok(task)
    }

    async fn ensure_assignee_exists(&self, assignee: Option<Uuid>) -> Result<()> {
        if let Some(id) = assignee {
            if self.users.find_by_id(id).await?.is_none() {
                return Err(AppError::Validation("Assigned user not found".to_string()));
            }
        }
        Ok(())
    }

    pub async fn create(
        &self,
        caller: &AuthUser,
        req: CreateTaskRequest,
        request: &RequestMeta,
    ) -> Result<Task> {
        self.ensure_assignee_exists(req.assigned_to).await?;

        let new_task = NewTask {
            title: req.title.trim().to_string(),
            description: req.description,
            category: req.category,
            priority: req.priority.unwrap_or_default(),
            assigned_to: req.assigned_to,
            assigned_by: caller.id,
            due_date: req
                .due_date
                .unwrap_or_else(|| req.category.default_due_date(Utc::now())),
            estimated_time: req.estimated_time,
        };

        let task = self.tasks.create(&new_task).await?;
        self.effects.created(&task, caller.id, request).await;

        Ok(task)
    }

    pub async fn update(
        &self,
        caller: &AuthUser,
        id: Uuid,
        changes: TaskChanges,
        request: &RequestMeta,
    ) -> Result<Task> {
        let previous = self.find(id).await?;
        if !caller.is_admin() && !previous.involves(caller.id) {
            return Err(AppError::Forbidden(
                "You don't have permission to update this task".to_string(),
            ));
        }
        if changes.is_empty() {
            return Ok(previous);
        }
        self.ensure_assignee_exists(changes.assigned_to).await?;

        let task = self
            .tasks
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

        self.effects
            .updated(&previous, &task, &changes, caller.id, request)
            .await;

        Ok(task)
    }

    /// Only the assignee or an admin may move a task through its lifecycle.
    pub async fn update_status(
        &self,
        caller: &AuthUser,
        id: Uuid,
        status: TaskStatus,
        actual_time: Option<i32>,
        request: &RequestMeta,
    ) -> Result<Task> {
        let previous = self.find(id).await?;
        if !caller.is_admin() && previous.assigned_to != Some(caller.id) {
            return Err(AppError::Forbidden(
                "You can only update status of tasks assigned to you".to_string(),
            ));
        }

        let task = self
            .tasks
            .update_status(id, status, actual_time)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

        self.effects
            .status_changed(previous.status, &task, actual_time, caller.id, request)
            .await;

        Ok(task)
    }

    /// Only the creator or an admin may delete.
    pub async fn delete(&self, caller: &AuthUser, id: Uuid, request: &RequestMeta) -> Result<()> {
        let task = self.find(id).await?;
        if !caller.is_admin() && task.assigned_by != Some(caller.id) {
            return Err(AppError::Forbidden(
                "You don't have permission to delete this task".to_string(),
            ));
        }

        if self.tasks.delete(id).await? == 0 {
            return Err(AppError::NotFound("Task not found".to_string()));
        }
        self.effects.deleted(&task, caller.id, request).await;

        Ok(())
    }

    /// Runs the overdue sweep first so the counts reflect the current time.
    pub async fn stats(&self, caller: &AuthUser, request: &RequestMeta) -> Result<TaskStats> {
        self.tasks.mark_overdue().await?;

        let scope = (!caller.is_admin()).then_some(caller.id);
        let counts = self.tasks.counts(scope).await?;

        self.activity
            .log(
                caller.id,
                ActivityType::DashboardViewed,
                "Viewed dashboard stats",
                json!({}),
                request,
            )
            .await;

        Ok(counts.into())
    }
}
