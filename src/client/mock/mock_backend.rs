use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    seed,
    storage::{KeyValueStore, StorageError},
};
use crate::{
    auth::{
        auth_dto::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
        password::MIN_PASSWORD_LENGTH,
    },
    client::api::{ClientError, ClientResult, PortalBackend},
    notification::{
        notification_dto::NotificationListQuery,
        notification_models::{NewNotification, Notification, NotificationFilters},
    },
    remark::{
        remark_dto::{CreateRemarkRequest, RemarkListQuery, RespondRemarkRequest},
        remark_models::{Remark, RemarkFilters},
    },
    task::{
        task_dto::{CreateTaskRequest, TaskListQuery, UpdateTaskRequest, UpdateTaskStatusRequest},
        task_models::{Task, TaskChanges, TaskCounts, TaskFilters, TaskStats, TaskStatus},
    },
    user::user_models::{ProfileChanges, Role, UserResponse},
};

pub const USERS_KEY: &str = "portal_users";
pub const TASKS_KEY: &str = "portal_tasks";
pub const NOTIFICATIONS_KEY: &str = "portal_notifications";
pub const REMARKS_KEY: &str = "portal_remarks";
pub const CREDENTIALS_KEY: &str = "portal_credentials";
pub const SESSION_KEY: &str = "portal_session_user";

fn invalid_credentials() -> ClientError {
    ClientError::Unauthorized("Invalid credentials".to_string())
}

fn task_not_found() -> ClientError {
    ClientError::NotFound("Task not found".to_string())
}

fn notification_not_found() -> ClientError {
    ClientError::NotFound("Notification not found".to_string())
}

fn materialize(notification: NewNotification, now: DateTime<Utc>) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        title: notification.title,
        message: notification.message,
        notification_type: notification.notification_type,
        priority: notification.priority,
        user_id: notification.user_id,
        is_read: false,
        metadata: notification.metadata,
        created_at: now,
    }
}

/// Local stand-in for the portal API. Each collection lives under its own
/// key and is rewritten whole on every change.
pub struct MockPortal {
    store: Arc<dyn KeyValueStore>,
}

impl MockPortal {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads a collection, writing the seed when the key is missing or its
    /// content no longer parses.
    fn load<T>(&self, key: &str, seed: impl FnOnce() -> T) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(raw) = self.store.get(key)? {
            match serde_json::from_str(&raw) {
                Ok(value) => return Ok(value),
                Err(e) => tracing::warn!("Stored {} is unreadable, reseeding: {}", key, e),
            }
        }

        let value = seed();
        self.save(key, &value)?;
        Ok(value)
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> ClientResult<()> {
        let raw = serde_json::to_string(value).map_err(StorageError::from)?;
        self.store.set(key, &raw)?;
        Ok(())
    }

    fn users(&self) -> ClientResult<Vec<UserResponse>> {
        self.load(USERS_KEY, || seed::users(Utc::now()))
    }

    fn tasks(&self) -> ClientResult<Vec<Task>> {
        self.load(TASKS_KEY, || seed::tasks(Utc::now()))
    }

    fn notifications(&self) -> ClientResult<Vec<Notification>> {
        self.load(NOTIFICATIONS_KEY, || seed::notifications(Utc::now()))
    }

    fn remarks(&self) -> ClientResult<Vec<Remark>> {
        self.load(REMARKS_KEY, || seed::remarks(Utc::now()))
    }

    fn credentials(&self) -> ClientResult<HashMap<String, String>> {
        self.load(CREDENTIALS_KEY, seed::credentials)
    }

    pub fn session_user(&self) -> ClientResult<Option<UserResponse>> {
        let Some(raw) = self.store.get(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!("Stored session is unreadable, signing out: {}", e);
                self.store.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    pub fn set_session_user(&self, user: &UserResponse) -> ClientResult<()> {
        self.save(SESSION_KEY, user)
    }

    fn caller(&self) -> ClientResult<UserResponse> {
        self.session_user()?.ok_or_else(ClientError::not_signed_in)
    }

    fn notify(&self, notification: NewNotification, now: DateTime<Utc>) -> ClientResult<()> {
        let mut notifications = self.notifications()?;
        notifications.push(materialize(notification, now));
        self.save(NOTIFICATIONS_KEY, &notifications)
    }

    pub fn login(&self, credentials: &LoginRequest) -> ClientResult<UserResponse> {
        credentials.validate()?;
        let email = credentials.email.trim().to_lowercase();

        let passwords = self.credentials()?;
        if passwords.get(&email) != Some(&credentials.password) {
            return Err(invalid_credentials());
        }

        let mut users = self.users()?;
        let user = users
            .iter_mut()
            .find(|u| u.email == email && u.role == credentials.role && u.is_active)
            .ok_or_else(invalid_credentials)?;
        user.last_login = Some(Utc::now());
        let user = user.clone();

        self.save(USERS_KEY, &users)?;
        self.set_session_user(&user)?;
        Ok(user)
    }

    pub fn signup(&self, registration: &RegisterRequest) -> ClientResult<UserResponse> {
        registration.validate()?;
        let req = registration.clone().normalized();

        let mut passwords = self.credentials()?;
        let mut users = self.users()?;
        if passwords.contains_key(&req.email) || users.iter().any(|u| u.email == req.email) {
            return Err(ClientError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let user = UserResponse {
            id: Uuid::new_v4(),
            name: req.name,
            email: req.email.clone(),
            role: req.role,
            post: Some(req.post.unwrap_or_else(|| "Staff".to_string())),
            department: Some(req.department.unwrap_or_else(|| "General".to_string())),
            avatar_url: None,
            join_date: Utc::now(),
            last_login: None,
            is_active: true,
        };

        users.push(user.clone());
        passwords.insert(req.email, req.password);
        self.save(USERS_KEY, &users)?;
        self.save(CREDENTIALS_KEY, &passwords)?;
        self.set_session_user(&user)?;
        Ok(user)
    }

    pub fn current_user(&self) -> ClientResult<UserResponse> {
        self.caller()
    }

    pub fn update_profile(&self, changes: &UpdateProfileRequest) -> ClientResult<UserResponse> {
        changes.validate()?;
        let caller = self.caller()?;
        let changes = ProfileChanges::from(changes.clone());

        let mut users = self.users()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == caller.id)
            .ok_or_else(|| ClientError::NotFound("User not found".to_string()))?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(post) = changes.post {
            user.post = Some(post);
        }
        if let Some(department) = changes.department {
            user.department = Some(department);
        }
        if let Some(avatar_url) = changes.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        let user = user.clone();

        self.save(USERS_KEY, &users)?;
        self.set_session_user(&user)?;
        Ok(user)
    }

    pub fn change_password(&self, request: &ChangePasswordRequest) -> ClientResult<()> {
        request.validate()?;
        if request.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ClientError::Validation(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let caller = self.caller()?;
        let mut passwords = self.credentials()?;
        if passwords.get(&caller.email) != Some(&request.current_password) {
            return Err(ClientError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        passwords.insert(caller.email, request.new_password.clone());
        self.save(CREDENTIALS_KEY, &passwords)
    }

    pub fn logout(&self) -> ClientResult<()> {
        self.store.remove(SESSION_KEY)?;
        Ok(())
    }

    pub fn list_users(&self) -> ClientResult<Vec<UserResponse>> {
        self.users()
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> ClientResult<Vec<Task>> {
        let caller = self.caller()?;
        let filters = TaskFilters {
            assigned_to: if caller.role == Role::Admin {
                query.assigned_to
            } else {
                Some(caller.id)
            },
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

        let mut tasks: Vec<Task> = self
            .tasks()?
            .into_iter()
            .filter(|t| filters.matches(t))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(query.limit() as usize);
        Ok(tasks)
    }

    pub fn get_task(&self, id: Uuid) -> ClientResult<Task> {
        let caller = self.caller()?;
        let task = self
            .tasks()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(task_not_found)?;

        if caller.role != Role::Admin && !task.involves(caller.id) {
            return Err(ClientError::Forbidden(
                "You don't have permission to view this task".to_string(),
            ));
        }
        Ok(task)
    }

    fn ensure_assignee_exists(&self, assignee: Option<Uuid>) -> ClientResult<()> {
        if let Some(id) = assignee {
            if !self.users()?.iter().any(|u| u.id == id) {
                return Err(ClientError::Validation("Assigned user not found".to_string()));
            }
        }
        Ok(())
    }

    pub fn create_task(&self, req: &CreateTaskRequest) -> ClientResult<Task> {
        req.validate()?;
        let caller = self.caller()?;
        self.ensure_assignee_exists(req.assigned_to)?;

        let now = Utc::now();
        let mut task = Task {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            description: req.description.clone(),
            category: req.category,
            status: TaskStatus::Pending,
            priority: req.priority.unwrap_or_default(),
            assigned_to: req.assigned_to,
            assigned_by: Some(caller.id),
            due_date: Some(req.due_date.unwrap_or_else(|| req.category.default_due_date(now))),
            estimated_time: req.estimated_time,
            actual_time: None,
            remarks: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            assigned_to_name: None,
            assigned_to_email: None,
            assigned_by_name: None,
            assigned_by_email: None,
        };
        seed::attach_people(&mut task, &self.users()?);

        let mut tasks = self.tasks()?;
        tasks.push(task.clone());
        self.save(TASKS_KEY, &tasks)?;

        if let Some(assignee) = task.assigned_to.filter(|a| *a != caller.id) {
            self.notify(NewNotification::task_assigned(&task, assignee), now)?;
        }
        Ok(task)
    }

    pub fn update_task(&self, id: Uuid, req: &UpdateTaskRequest) -> ClientResult<Task> {
        req.validate()?;
        let caller = self.caller()?;
        let changes = TaskChanges::from(req.clone());

        let mut tasks = self.tasks()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(task_not_found)?;
        if caller.role != Role::Admin && !task.involves(caller.id) {
            return Err(ClientError::Forbidden(
                "You don't have permission to update this task".to_string(),
            ));
        }
        if changes.is_empty() {
            return Ok(task.clone());
        }
        self.ensure_assignee_exists(changes.assigned_to)?;

        let previous_assignee = task.assigned_to;
        let now = Utc::now();
        changes.apply(task);
        if changes.assigned_to.is_some() {
            seed::attach_people(task, &self.users()?);
        }
        task.updated_at = now;
        let task = task.clone();
        self.save(TASKS_KEY, &tasks)?;

        let reassigned = changes
            .assigned_to
            .filter(|a| *a != caller.id && Some(*a) != previous_assignee);
        if let Some(assignee) = reassigned {
            self.notify(NewNotification::task_assigned(&task, assignee), now)?;
        }
        Ok(task)
    }

    pub fn update_task_status(
        &self,
        id: Uuid,
        req: &UpdateTaskStatusRequest,
    ) -> ClientResult<Task> {
        req.validate()?;
        let caller = self.caller()?;

        let mut tasks = self.tasks()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(task_not_found)?;
        if caller.role != Role::Admin && task.assigned_to != Some(caller.id) {
            return Err(ClientError::Forbidden(
                "You can only update status of tasks assigned to you".to_string(),
            ));
        }

        let now = Utc::now();
        task.status = req.status;
        task.updated_at = now;
        if req.status == TaskStatus::Completed {
            task.completed_at = Some(now);
            if req.actual_time.is_some() {
                task.actual_time = req.actual_time;
            }
        }
        let task = task.clone();

        self.save(TASKS_KEY, &tasks)?;
        Ok(task)
    }

    pub fn delete_task(&self, id: Uuid) -> ClientResult<()> {
        let caller = self.caller()?;
        let mut tasks = self.tasks()?;
        let task = tasks.iter().find(|t| t.id == id).ok_or_else(task_not_found)?;
        if caller.role != Role::Admin && task.assigned_by != Some(caller.id) {
            return Err(ClientError::Forbidden(
                "You don't have permission to delete this task".to_string(),
            ));
        }

        tasks.retain(|t| t.id != id);
        self.save(TASKS_KEY, &tasks)
    }

    /// Flips late tasks to overdue before counting, as the server does.
    pub fn task_stats(&self) -> ClientResult<TaskStats> {
        let caller = self.caller()?;
        let now = Utc::now();

        let mut tasks = self.tasks()?;
        let mut swept = 0;
        for task in tasks.iter_mut().filter(|t| t.is_overdue_at(now)) {
            task.status = TaskStatus::Overdue;
            task.updated_at = now;
            swept += 1;
        }
        if swept > 0 {
            self.save(TASKS_KEY, &tasks)?;
        }

        let scoped = tasks
            .iter()
            .filter(|t| caller.role == Role::Admin || t.assigned_to == Some(caller.id));
        Ok(TaskCounts::tally(scoped, now).into())
    }

    pub fn list_notifications(&self, query: &NotificationListQuery) -> ClientResult<Vec<Notification>> {
        let caller = self.caller()?;
        let filters = NotificationFilters::from(query.clone());

        let mut notifications: Vec<Notification> = self
            .notifications()?
            .into_iter()
            .filter(|n| n.user_id == caller.id && filters.matches(n))
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filters.limit {
            notifications.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(notifications)
    }

    pub fn unread_count(&self) -> ClientResult<i64> {
        let caller = self.caller()?;
        let count = self
            .notifications()?
            .iter()
            .filter(|n| n.user_id == caller.id && !n.is_read)
            .count();
        Ok(count as i64)
    }

    pub fn mark_notification_read(&self, id: Uuid) -> ClientResult<Notification> {
        let caller = self.caller()?;
        let mut notifications = self.notifications()?;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == caller.id)
            .ok_or_else(notification_not_found)?;
        notification.is_read = true;
        let notification = notification.clone();

        self.save(NOTIFICATIONS_KEY, &notifications)?;
        Ok(notification)
    }

    pub fn mark_all_notifications_read(&self) -> ClientResult<()> {
        let caller = self.caller()?;
        let mut notifications = self.notifications()?;
        for notification in notifications.iter_mut().filter(|n| n.user_id == caller.id) {
            notification.is_read = true;
        }
        self.save(NOTIFICATIONS_KEY, &notifications)
    }

    pub fn delete_notification(&self, id: Uuid) -> ClientResult<()> {
        let caller = self.caller()?;
        let mut notifications = self.notifications()?;
        let before = notifications.len();
        notifications.retain(|n| !(n.id == id && n.user_id == caller.id));
        if notifications.len() == before {
            return Err(notification_not_found());
        }
        self.save(NOTIFICATIONS_KEY, &notifications)
    }

    pub fn list_remarks(&self, query: &RemarkListQuery) -> ClientResult<Vec<Remark>> {
        let caller = self.caller()?;
        let filters = RemarkFilters {
            user_id: if caller.role == Role::Admin {
                query.user_id
            } else {
                Some(caller.id)
            },
            task_id: query.task_id,
            remark_type: query.remark_type,
        };

        let mut remarks: Vec<Remark> = self
            .remarks()?
            .into_iter()
            .filter(|r| filters.matches(r))
            .collect();
        remarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(remarks)
    }

    pub fn add_remark(&self, req: &CreateRemarkRequest) -> ClientResult<Remark> {
        req.validate()?;
        let caller = self.caller()?;
        if let Some(task_id) = req.task_id {
            if !self.tasks()?.iter().any(|t| t.id == task_id) {
                return Err(ClientError::Validation("Task not found".to_string()));
            }
        }

        let remark = Remark {
            id: Uuid::new_v4(),
            user_id: caller.id,
            task_id: req.task_id,
            message: req.message.trim().to_string(),
            remark_type: req.remark_type,
            admin_response: None,
            responded_at: None,
            created_at: Utc::now(),
        };

        let mut remarks = self.remarks()?;
        remarks.push(remark.clone());
        self.save(REMARKS_KEY, &remarks)?;
        Ok(remark)
    }

    pub fn respond_to_remark(&self, id: Uuid, response: &str) -> ClientResult<Remark> {
        let caller = self.caller()?;
        if caller.role != Role::Admin {
            return Err(ClientError::Forbidden("Insufficient permissions".to_string()));
        }
        RespondRemarkRequest {
            response: response.to_string(),
        }
        .validate()?;

        let mut remarks = self.remarks()?;
        let remark = remarks
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ClientError::NotFound("Remark not found".to_string()))?;
        remark.admin_response = Some(response.trim().to_string());
        remark.responded_at = Some(Utc::now());
        let remark = remark.clone();

        self.save(REMARKS_KEY, &remarks)?;
        Ok(remark)
    }

    pub fn delete_remark(&self, id: Uuid) -> ClientResult<()> {
        let caller = self.caller()?;
        let mut remarks = self.remarks()?;
        let remark = remarks
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ClientError::NotFound("Remark not found".to_string()))?;
        if caller.role != Role::Admin && remark.user_id != caller.id {
            return Err(ClientError::Forbidden(
                "You can only delete your own remarks".to_string(),
            ));
        }

        remarks.retain(|r| r.id != id);
        self.save(REMARKS_KEY, &remarks)
    }
}

/// Serializes every mock operation behind one lock.
pub struct MockBackend {
    portal: Mutex<MockPortal>,
}

impl MockBackend {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            portal: Mutex::new(MockPortal::new(store)),
        }
    }

    fn with_portal<T>(&self, op: impl FnOnce(&MockPortal) -> ClientResult<T>) -> ClientResult<T> {
        let portal = self
            .portal
            .lock()
            .map_err(|_| ClientError::Storage(StorageError::Poisoned))?;
        op(&portal)
    }

    /// Mirrors a session established against the live backend so reads that
    /// fall back here are scoped to the same user.
    pub fn remember_session(&self, user: &UserResponse) -> ClientResult<()> {
        self.with_portal(|p| p.set_session_user(user))
    }

    pub fn forget_session(&self) -> ClientResult<()> {
        self.with_portal(|p| p.logout())
    }
}

#[async_trait]
impl PortalBackend for MockBackend {
    async fn login(&self, credentials: &LoginRequest) -> ClientResult<UserResponse> {
        self.with_portal(|p| p.login(credentials))
    }

    async fn signup(&self, registration: &RegisterRequest) -> ClientResult<UserResponse> {
        self.with_portal(|p| p.signup(registration))
    }

    async fn current_user(&self) -> ClientResult<UserResponse> {
        self.with_portal(|p| p.current_user())
    }

    async fn update_profile(&self, changes: &UpdateProfileRequest) -> ClientResult<UserResponse> {
        self.with_portal(|p| p.update_profile(changes))
    }

    async fn change_password(&self, request: &ChangePasswordRequest) -> ClientResult<()> {
        self.with_portal(|p| p.change_password(request))
    }

    async fn logout(&self) -> ClientResult<()> {
        self.with_portal(|p| p.logout())
    }

    async fn list_users(&self) -> ClientResult<Vec<UserResponse>> {
        self.with_portal(|p| p.list_users())
    }

    async fn list_tasks(&self, query: &TaskListQuery) -> ClientResult<Vec<Task>> {
        self.with_portal(|p| p.list_tasks(query))
    }

    async fn get_task(&self, id: Uuid) -> ClientResult<Task> {
        self.with_portal(|p| p.get_task(id))
    }

    async fn create_task(&self, task: &CreateTaskRequest) -> ClientResult<Task> {
        self.with_portal(|p| p.create_task(task))
    }

    async fn update_task(&self, id: Uuid, changes: &UpdateTaskRequest) -> ClientResult<Task> {
        self.with_portal(|p| p.update_task(id, changes))
    }

    async fn update_task_status(
        &self,
        id: Uuid,
        change: &UpdateTaskStatusRequest,
    ) -> ClientResult<Task> {
        self.with_portal(|p| p.update_task_status(id, change))
    }

    async fn delete_task(&self, id: Uuid) -> ClientResult<()> {
        self.with_portal(|p| p.delete_task(id))
    }

    async fn task_stats(&self) -> ClientResult<TaskStats> {
        self.with_portal(|p| p.task_stats())
    }

    async fn list_notifications(
        &self,
        query: &NotificationListQuery,
    ) -> ClientResult<Vec<Notification>> {
        self.with_portal(|p| p.list_notifications(query))
    }

    async fn unread_count(&self) -> ClientResult<i64> {
        self.with_portal(|p| p.unread_count())
    }

    async fn mark_notification_read(&self, id: Uuid) -> ClientResult<Notification> {
        self.with_portal(|p| p.mark_notification_read(id))
    }

    async fn mark_all_notifications_read(&self) -> ClientResult<()> {
        self.with_portal(|p| p.mark_all_notifications_read())
    }

    async fn delete_notification(&self, id: Uuid) -> ClientResult<()> {
        self.with_portal(|p| p.delete_notification(id))
    }

    async fn list_remarks(&self, query: &RemarkListQuery) -> ClientResult<Vec<Remark>> {
        self.with_portal(|p| p.list_remarks(query))
    }

    async fn add_remark(&self, remark: &CreateRemarkRequest) -> ClientResult<Remark> {
        self.with_portal(|p| p.add_remark(remark))
    }

    async fn respond_to_remark(&self, id: Uuid, response: &str) -> ClientResult<Remark> {
        self.with_portal(|p| p.respond_to_remark(id, response))
    }

    async fn delete_remark(&self, id: Uuid) -> ClientResult<()> {
        self.with_portal(|p| p.delete_remark(id))
    }
}
