//! In-memory repositories and fixtures for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    activity::{
        activity_models::NewActivity, Activity, ActivityFilters, ActivityRepository, ActivityStat,
        ActivityType,
    },
    auth::{hash_password, AuthService, TokenKeys},
    error::{AppError, Result},
    notification::{
        notification_models::{NewNotification, NotificationFilters},
        Notification, NotificationRepository, NotificationService,
    },
    remark::{
        remark_models::{NewRemark, RemarkFilters},
        Remark, RemarkRepository, RemarkService,
    },
    state::{AppState, Config, Repositories},
    task::{
        task_models::{NewTask, TaskChanges, TaskCounts, TaskFilters},
        Priority, Task, TaskCategory, TaskRepository, TaskService, TaskStatus,
    },
    user::{
        user_models::{NewUser, ProfileChanges},
        Role, User, UserRepository, UserService,
    },
    websocket::RoomRegistry,
};

pub const SEED_PASSWORD: &str = "password123";

fn display_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn sample_user(email: &str, role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: display_name(email),
        email: email.to_string(),
        password_hash: String::new(),
        role,
        post: None,
        department: None,
        avatar_url: None,
        join_date: now,
        last_login: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Pending daily task, due tomorrow, unassigned.
pub fn sample_task(title: &str) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        category: TaskCategory::Daily,
        status: TaskStatus::Pending,
        priority: Priority::Medium,
        assigned_to: None,
        assigned_by: None,
        due_date: Some(now + Duration::days(1)),
        estimated_time: None,
        actual_time: None,
        remarks: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
        assigned_to_name: None,
        assigned_to_email: None,
        assigned_by_name: None,
        assigned_by_email: None,
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn get(&self, id: Uuid) -> Option<User> {
        self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Resource already exists".to_string()));
        }
        let mut created = sample_user(&user.email, user.role);
        created.name = user.name.clone();
        created.password_hash = user.password_hash.clone();
        created.post = user.post.clone();
        created.department = user.department.clone();
        rows.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.get(id).filter(|u| u.is_active))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email && u.is_active).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.rows.lock().unwrap().iter().any(|u| u.email == email))
    }

    async fn find_all(&self, role: Option<Role>) -> Result<Vec<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .rev()
            .filter(|u| role.map_or(true, |r| r == u.role))
            .cloned()
            .collect())
    }

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(user) = rows.iter_mut().find(|u| u.id == id && u.is_active) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(post) = &changes.post {
            user.post = Some(post.clone());
        }
        if let Some(department) = &changes.department {
            user.department = Some(department.clone());
        }
        if let Some(avatar_url) = &changes.avatar_url {
            user.avatar_url = Some(avatar_url.clone());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn update_last_login(&self, id: Uuid) -> Result<()> {
        if let Some(user) = self.rows.lock().unwrap().iter_mut().find(|u| u.id == id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        if let Some(user) = self.rows.lock().unwrap().iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|u| u.id == id && u.is_active) {
            Some(user) => {
                user.is_active = false;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[derive(Default)]
pub struct MemoryTaskRepository {
    rows: Mutex<Vec<Task>>,
}

impl MemoryTaskRepository {
    pub fn insert(&self, task: Task) {
        self.rows.lock().unwrap().push(task);
    }

    pub fn get(&self, id: Uuid) -> Option<Task> {
        self.rows.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    fn modify(&self, id: Uuid, change: impl FnOnce(&mut Task)) -> Option<Task> {
        let mut rows = self.rows.lock().unwrap();
        let task = rows.iter_mut().find(|t| t.id == id)?;
        change(task);
        task.updated_at = Utc::now();
        Some(task.clone())
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, new_task: &NewTask) -> Result<Task> {
        let mut task = sample_task(&new_task.title);
        task.description = new_task.description.clone();
        task.category = new_task.category;
        task.priority = new_task.priority;
        task.assigned_to = new_task.assigned_to;
        task.assigned_by = Some(new_task.assigned_by);
        task.due_date = Some(new_task.due_date);
        task.estimated_time = new_task.estimated_time;
        self.insert(task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>> {
        Ok(self.get(id))
    }

    async fn find_all(&self, filters: &TaskFilters) -> Result<Vec<Task>> {
        let rows = self.rows.lock().unwrap();
        let mut found: Vec<Task> = rows.iter().rev().filter(|t| filters.matches(t)).cloned().collect();
        if let Some(limit) = filters.limit {
            found.truncate(limit.max(0) as usize);
        }
        Ok(found)
    }

    async fn update(&self, id: Uuid, changes: &TaskChanges) -> Result<Option<Task>> {
        Ok(self.modify(id, |task| changes.apply(task)))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        actual_time: Option<i32>,
    ) -> Result<Option<Task>> {
        Ok(self.modify(id, |task| {
            task.status = status;
            if status == TaskStatus::Completed {
                task.completed_at = Some(Utc::now());
                if actual_time.is_some() {
                    task.actual_time = actual_time;
                }
            }
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| t.id != id);
        Ok((before - rows.len()) as u64)
    }

    async fn mark_overdue(&self) -> Result<Vec<Task>> {
        let now = Utc::now();
        let mut rows = self.rows.lock().unwrap();
        let mut flipped = Vec::new();
        for task in rows.iter_mut().filter(|t| t.is_overdue_at(now)) {
            task.status = TaskStatus::Overdue;
            task.updated_at = now;
            flipped.push(task.clone());
        }
        Ok(flipped)
    }

    async fn counts(&self, assigned_to: Option<Uuid>) -> Result<TaskCounts> {
        let rows = self.rows.lock().unwrap();
        let scoped = rows
            .iter()
            .filter(|t| assigned_to.map_or(true, |id| t.assigned_to == Some(id)));
        Ok(TaskCounts::tally(scoped, Utc::now()))
    }
}

#[derive(Default)]
pub struct MemoryNotificationRepository {
    rows: Mutex<Vec<Notification>>,
}

impl MemoryNotificationRepository {
    pub fn get(&self, id: Uuid) -> Option<Notification> {
        self.rows.lock().unwrap().iter().find(|n| n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn for_user(&self, user_id: Uuid) -> Vec<Notification> {
        let rows = self.rows.lock().unwrap();
        rows.iter().filter(|n| n.user_id == user_id).cloned().collect()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn create(&self, new: &NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            title: new.title.clone(),
            message: new.message.clone(),
            notification_type: new.notification_type,
            priority: new.priority,
            user_id: new.user_id,
            is_read: false,
            metadata: new.metadata.clone(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(notification.clone());
        Ok(notification)
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        filters: &NotificationFilters,
    ) -> Result<Vec<Notification>> {
        let rows = self.rows.lock().unwrap();
        let mut found: Vec<Notification> = rows
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && filters.matches(n))
            .cloned()
            .collect();
        if let Some(limit) = filters.limit {
            found.truncate(limit.max(0) as usize);
        }
        Ok(found)
    }

    async fn mark_as_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }

    async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let mut updated = 0;
        for n in rows.iter_mut().filter(|n| n.user_id == user_id && !n.is_read) {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| !(n.id == id && n.user_id == user_id));
        Ok((before - rows.len()) as u64)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|n| n.user_id == user_id && !n.is_read).count() as i64)
    }
}

#[derive(Default)]
pub struct MemoryActivityRepository {
    rows: Mutex<Vec<Activity>>,
}

impl MemoryActivityRepository {
    pub fn count_of(&self, activity_type: ActivityType) -> usize {
        let rows = self.rows.lock().unwrap();
        rows.iter().filter(|a| a.activity_type == activity_type).count()
    }
}

#[async_trait]
impl ActivityRepository for MemoryActivityRepository {
    async fn record(&self, activity: &NewActivity) -> Result<()> {
        self.rows.lock().unwrap().push(Activity {
            id: Uuid::new_v4(),
            user_id: Some(activity.user_id),
            activity_type: activity.activity_type,
            description: activity.description.clone(),
            metadata: activity.metadata.clone(),
            ip_address: activity.request.ip_address.clone(),
            user_agent: activity.request.user_agent.clone(),
            created_at: Utc::now(),
            user_name: None,
            user_email: None,
        });
        Ok(())
    }

    async fn find_all(&self, filters: &ActivityFilters) -> Result<Vec<Activity>> {
        let rows = self.rows.lock().unwrap();
        let mut found: Vec<Activity> = rows
            .iter()
            .rev()
            .filter(|a| filters.user_id.map_or(true, |id| a.user_id == Some(id)))
            .filter(|a| filters.activity_type.map_or(true, |t| t == a.activity_type))
            .filter(|a| filters.start_date.map_or(true, |d| a.created_at >= d))
            .filter(|a| filters.end_date.map_or(true, |d| a.created_at <= d))
            .cloned()
            .collect();
        if let Some(limit) = filters.limit {
            found.truncate(limit.max(0) as usize);
        }
        Ok(found)
    }

    async fn stats(&self, user_id: Option<Uuid>) -> Result<Vec<ActivityStat>> {
        let rows = self.rows.lock().unwrap();
        let mut counts: HashMap<(ActivityType, chrono::NaiveDate), i64> = HashMap::new();
        for a in rows
            .iter()
            .filter(|a| user_id.map_or(true, |id| a.user_id == Some(id)))
        {
            *counts.entry((a.activity_type, a.created_at.date_naive())).or_default() += 1;
        }
        let mut stats: Vec<ActivityStat> = counts
            .into_iter()
            .map(|((activity_type, date), count)| ActivityStat {
                activity_type,
                date,
                count,
            })
            .collect();
        stats.sort_by(|a, b| b.date.cmp(&a.date).then(b.count.cmp(&a.count)));
        Ok(stats)
    }
}

#[derive(Default)]
pub struct MemoryRemarkRepository {
    rows: Mutex<Vec<Remark>>,
}

#[async_trait]
impl RemarkRepository for MemoryRemarkRepository {
    async fn create(&self, new: &NewRemark) -> Result<Remark> {
        let remark = Remark {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            task_id: new.task_id,
            message: new.message.clone(),
            remark_type: new.remark_type,
            admin_response: None,
            responded_at: None,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(remark.clone());
        Ok(remark)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Remark>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn find_all(&self, filters: &RemarkFilters) -> Result<Vec<Remark>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().rev().filter(|r| filters.matches(r)).cloned().collect())
    }

    async fn respond(&self, id: Uuid, response: &str) -> Result<Option<Remark>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|r| r.id == id).map(|r| {
            r.admin_response = Some(response.to_string());
            r.responded_at = Some(Utc::now());
            r.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok((before - rows.len()) as u64)
    }
}

fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/amc_portal_test".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "test-access-secret".to_string(),
        jwt_refresh_secret: "test-refresh-secret".to_string(),
        access_ttl_minutes: 15,
        refresh_ttl_days: 7,
        bcrypt_cost: 4,
        db_max_connections: 1,
        frontend_url: None,
        overdue_sweep_cron: None,
    }
}

/// Fully wired application state over in-memory repositories.
pub struct TestContext {
    pub users: Arc<MemoryUserRepository>,
    pub tasks: Arc<MemoryTaskRepository>,
    pub notifications: Arc<MemoryNotificationRepository>,
    pub activities: Arc<MemoryActivityRepository>,
    pub remarks: Arc<MemoryRemarkRepository>,
    pub rooms: RoomRegistry,
    pub tokens: TokenKeys,
    pub auth: AuthService,
    pub user_service: UserService,
    pub task_service: TaskService,
    pub notification_service: NotificationService,
    pub remark_service: RemarkService,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserRepository::default());
        let tasks = Arc::new(MemoryTaskRepository::default());
        let notifications = Arc::new(MemoryNotificationRepository::default());
        let activities = Arc::new(MemoryActivityRepository::default());
        let remarks = Arc::new(MemoryRemarkRepository::default());

        let repos = Repositories {
            users: users.clone(),
            tasks: tasks.clone(),
            notifications: notifications.clone(),
            activities: activities.clone(),
            remarks: remarks.clone(),
        };
        let config = test_config();
        let tokens = config.token_keys();
        let state = AppState::new(config, repos);

        Self {
            users,
            tasks,
            notifications,
            activities,
            remarks,
            rooms: state.rooms.clone(),
            tokens,
            auth: state.auth_service.clone(),
            user_service: state.user_service.clone(),
            task_service: state.task_service.clone(),
            notification_service: state.notification_service.clone(),
            remark_service: state.remark_service.clone(),
            state,
        }
    }

    /// Stores an active user whose password is [`SEED_PASSWORD`].
    pub async fn add_user(&self, email: &str, role: Role) -> User {
        let password_hash = hash_password(SEED_PASSWORD, 4).unwrap();
        self.users
            .create(&NewUser {
                name: display_name(email),
                email: email.to_string(),
                password_hash,
                role,
                post: None,
                department: None,
            })
            .await
            .unwrap()
    }
}
