use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::auth_dto::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
    client::mock::StorageError,
    notification::{notification_dto::NotificationListQuery, notification_models::Notification},
    remark::{
        remark_dto::{CreateRemarkRequest, RemarkListQuery},
        remark_models::Remark,
    },
    task::{
        task_dto::{CreateTaskRequest, TaskListQuery, UpdateTaskRequest, UpdateTaskStatusRequest},
        task_models::{Task, TaskStats},
    },
    user::user_models::UserResponse,
};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Maps an HTTP failure to a typed error. The server's own message wins
    /// when the body carried one.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = message.filter(|m| !m.trim().is_empty());
        match status {
            400 | 422 => Self::Validation(
                message.unwrap_or_else(|| "Invalid input. Please check all required fields.".into()),
            ),
            401 => Self::Unauthorized(
                message.unwrap_or_else(|| "Your session has expired. Please log in again.".into()),
            ),
            403 => Self::Forbidden(
                message.unwrap_or_else(|| "You don't have permission to do that.".into()),
            ),
            404 => Self::NotFound(
                message.unwrap_or_else(|| "The requested item could not be found.".into()),
            ),
            409 => Self::Conflict(
                message.unwrap_or_else(|| "This item already exists.".into()),
            ),
            _ => Self::Server(message.unwrap_or_else(|| {
                format!("Server error ({}). Please try again later.", status)
            })),
        }
    }

    pub fn not_signed_in() -> Self {
        Self::Unauthorized("Not signed in".to_string())
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(_, errs)| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect();
        messages.sort();

        if messages.is_empty() {
            Self::Validation("Validation failed".to_string())
        } else {
            Self::Validation(messages.join(", "))
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Every portal operation a UI needs. Implemented by the HTTP client and by
/// the local mock so callers can swap them freely.
#[async_trait]
pub trait PortalBackend: Send + Sync {
    async fn login(&self, credentials: &LoginRequest) -> ClientResult<UserResponse>;
    async fn signup(&self, registration: &RegisterRequest) -> ClientResult<UserResponse>;
    async fn current_user(&self) -> ClientResult<UserResponse>;
    async fn update_profile(&self, changes: &UpdateProfileRequest) -> ClientResult<UserResponse>;
    async fn change_password(&self, request: &ChangePasswordRequest) -> ClientResult<()>;
    async fn logout(&self) -> ClientResult<()>;

    async fn list_users(&self) -> ClientResult<Vec<UserResponse>>;

    async fn list_tasks(&self, query: &TaskListQuery) -> ClientResult<Vec<Task>>;
    async fn get_task(&self, id: Uuid) -> ClientResult<Task>;
    async fn create_task(&self, task: &CreateTaskRequest) -> ClientResult<Task>;
    async fn update_task(&self, id: Uuid, changes: &UpdateTaskRequest) -> ClientResult<Task>;
    async fn update_task_status(
        &self,
        id: Uuid,
        change: &UpdateTaskStatusRequest,
    ) -> ClientResult<Task>;
    async fn delete_task(&self, id: Uuid) -> ClientResult<()>;
    async fn task_stats(&self) -> ClientResult<TaskStats>;

    async fn list_notifications(
        &self,
        query: &NotificationListQuery,
    ) -> ClientResult<Vec<Notification>>;
    async fn unread_count(&self) -> ClientResult<i64>;
    async fn mark_notification_read(&self, id: Uuid) -> ClientResult<Notification>;
    async fn mark_all_notifications_read(&self) -> ClientResult<()>;
    async fn delete_notification(&self, id: Uuid) -> ClientResult<()>;

    async fn list_remarks(&self, query: &RemarkListQuery) -> ClientResult<Vec<Remark>>;
    async fn add_remark(&self, remark: &CreateRemarkRequest) -> ClientResult<Remark>;
    async fn respond_to_remark(&self, id: Uuid, response: &str) -> ClientResult<Remark>;
    async fn delete_remark(&self, id: Uuid) -> ClientResult<()>;
}
