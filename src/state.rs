use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;

use crate::{
    activity::{ActivityLogger, ActivityRepository, PgActivityRepository},
    auth::{AuthService, TokenKeys},
    db::DbPool,
    notification::{NotificationRepository, NotificationService, PgNotificationRepository},
    remark::{PgRemarkRepository, RemarkRepository, RemarkService},
    task::{PgTaskRepository, TaskEffects, TaskRepository, TaskService},
    user::{PgUserRepository, UserRepository, UserService},
    websocket::RoomRegistry,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub db_max_connections: u32,
    /// Allowed CORS origin; any origin when unset.
    pub frontend_url: Option<String>,
    /// Six-field cron expression for the overdue sweep; disabled when unset.
    pub overdue_sweep_cron: Option<String>,
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).with_context(|| format!("{} must be set", key))
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = required("JWT_SECRET")?;
        let jwt_refresh_secret =
            optional("JWT_REFRESH_SECRET").unwrap_or_else(|| format!("{}-refresh", jwt_secret));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: optional("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed("PORT", 5000)?,
            jwt_secret,
            jwt_refresh_secret,
            access_ttl_minutes: parsed("JWT_EXPIRES_MINUTES", 60)?,
            refresh_ttl_days: parsed("JWT_REFRESH_EXPIRES_DAYS", 7)?,
            bcrypt_cost: parsed("BCRYPT_COST", 12)?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 20)?,
            frontend_url: optional("FRONTEND_URL"),
            overdue_sweep_cron: optional("OVERDUE_SWEEP_CRON"),
        })
    }

    pub fn token_keys(&self) -> TokenKeys {
        TokenKeys::new(
            self.jwt_secret.clone(),
            self.jwt_refresh_secret.clone(),
            Duration::minutes(self.access_ttl_minutes),
            Duration::days(self.refresh_ttl_days),
        )
    }
}

/// Storage seams. Production wires the Postgres implementations.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub remarks: Arc<dyn RemarkRepository>,
}

impl Repositories {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tasks: Arc::new(PgTaskRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
            activities: Arc::new(PgActivityRepository::new(pool.clone())),
            remarks: Arc::new(PgRemarkRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repos: Repositories,
    pub rooms: RoomRegistry,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub task_service: TaskService,
    pub notification_service: NotificationService,
    pub remark_service: RemarkService,
}

impl AppState {
    pub fn new(config: Config, repos: Repositories) -> Self {
        let rooms = RoomRegistry::new();
        let activity = ActivityLogger::new(repos.activities.clone());

        let auth_service = AuthService::new(
            repos.users.clone(),
            config.token_keys(),
            activity.clone(),
            config.bcrypt_cost,
        );
        let user_service = UserService::new(repos.users.clone(), activity.clone());
        let notification_service = NotificationService::new(
            repos.notifications.clone(),
            rooms.clone(),
            activity.clone(),
        );
        let effects = TaskEffects::new(activity.clone(), notification_service.clone(), rooms.clone());
        let task_service = TaskService::new(
            repos.tasks.clone(),
            repos.users.clone(),
            effects,
            activity.clone(),
        );
        let remark_service = RemarkService::new(repos.remarks.clone(), repos.tasks.clone(), activity);

        Self {
            config: Arc::new(config),
            repos,
            rooms,
            auth_service,
            user_service,
            task_service,
            notification_service,
            remark_service,
        }
    }
}
