use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth::auth_dto::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
    client::{
        api::{ClientResult, PortalBackend},
        config::ClientConfig,
        connectivity::{Connectivity, DataMode},
        live::LiveBackend,
        mock::{FileStore, KeyValueStore, MemoryStore, MockBackend},
        realtime::{RealtimeClient, RealtimeSubscription, ReconnectPolicy},
    },
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

/// Single entry point for UI code. Routes each call to the backend or the
/// local mock according to [`Connectivity`]. Reads that fail against the
/// backend are answered from the mock; writes report the failure.
pub struct DataAccess {
    live: Arc<LiveBackend>,
    mock: Arc<MockBackend>,
    connectivity: Arc<Connectivity>,
    ws_url: String,
}

impl DataAccess {
    pub fn new(
        live: Arc<LiveBackend>,
        mock: Arc<MockBackend>,
        connectivity: Arc<Connectivity>,
        ws_url: impl Into<String>,
    ) -> Self {
        Self {
            live,
            mock,
            connectivity,
            ws_url: ws_url.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let store: Arc<dyn KeyValueStore> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStore::new(dir)),
            None => Arc::new(MemoryStore::new()),
        };

        Self::new(
            Arc::new(LiveBackend::new(config.base_url.clone())),
            Arc::new(MockBackend::new(store)),
            Arc::new(Connectivity::new(config.force_mock)),
            config.ws_url.clone(),
        )
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn mode(&self) -> DataMode {
        self.connectivity.mode()
    }

    /// Probes the backend health endpoint and records the outcome.
    pub async fn refresh_connectivity(&self) -> DataMode {
        if self.connectivity.force_mock() {
            return DataMode::Mock;
        }

        let reachable = self.live.check_health().await;
        let was_reachable = self.connectivity.set_backend_reachable(reachable);
        if reachable != was_reachable {
            if reachable {
                tracing::info!("Backend connected, using live data");
            } else {
                tracing::warn!("Backend not available, using mock data");
            }
        }
        self.mode()
    }

    fn backend(&self) -> &dyn PortalBackend {
        match self.mode() {
            DataMode::Live => self.live.as_ref(),
            DataMode::Mock => self.mock.as_ref(),
        }
    }

    fn use_live(&self) -> bool {
        self.mode() == DataMode::Live
    }

    fn recovered<T>(&self, what: &str, result: ClientResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Failed to fetch {} from backend, using mock data: {}", what, e);
                None
            }
        }
    }

    fn remember(&self, user: &UserResponse) {
        if let Err(e) = self.mock.remember_session(user) {
            tracing::warn!("Failed to store session locally: {}", e);
        }
    }

    /// Opens the realtime channel for `user_id`. Mock mode and signed-out
    /// clients have nothing to subscribe to.
    pub fn subscribe(&self, user_id: Uuid) -> Option<RealtimeSubscription> {
        if !self.use_live() {
            return None;
        }
        self.live.access_token()?;
        Some(
            RealtimeClient::new(self.ws_url.clone(), ReconnectPolicy::default())
                .subscribe(self.live.clone(), user_id),
        )
    }

    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<UserResponse> {
        if !self.use_live() {
            return self.mock.login(credentials).await;
        }
        let user = self.live.login(credentials).await?;
        self.remember(&user);
        Ok(user)
    }

    pub async fn signup(&self, registration: &RegisterRequest) -> ClientResult<UserResponse> {
        if !self.use_live() {
            return self.mock.signup(registration).await;
        }
        let user = self.live.signup(registration).await?;
        self.remember(&user);
        Ok(user)
    }

    pub async fn current_user(&self) -> ClientResult<UserResponse> {
        if self.use_live() {
            if let Some(user) = self.recovered("current user", self.live.current_user().await) {
                return Ok(user);
            }
        }
        self.mock.current_user().await
    }

    pub async fn update_profile(&self, changes: &UpdateProfileRequest) -> ClientResult<UserResponse> {
        let user = self.backend().update_profile(changes).await?;
        if self.use_live() {
            self.remember(&user);
        }
        Ok(user)
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> ClientResult<()> {
        self.backend().change_password(request).await
    }

    /// Ends both sessions so a later fallback read is not scoped to a stale
    /// user.
    pub async fn logout(&self) -> ClientResult<()> {
        if self.use_live() {
            self.live.logout().await?;
        }
        self.mock.forget_session()
    }

    pub async fn list_users(&self) -> ClientResult<Vec<UserResponse>> {
        if self.use_live() {
            if let Some(users) = self.recovered("users", self.live.list_users().await) {
                return Ok(users);
            }
        }
        self.mock.list_users().await
    }

    pub async fn list_tasks(&self, query: &TaskListQuery) -> ClientResult<Vec<Task>> {
        if self.use_live() {
            if let Some(tasks) = self.recovered("tasks", self.live.list_tasks(query).await) {
                return Ok(tasks);
            }
        }
        self.mock.list_tasks(query).await
    }

    pub async fn get_task(&self, id: Uuid) -> ClientResult<Task> {
        if self.use_live() {
            if let Some(task) = self.recovered("task", self.live.get_task(id).await) {
                return Ok(task);
            }
        }
        self.mock.get_task(id).await
    }

    pub async fn create_task(&self, task: &CreateTaskRequest) -> ClientResult<Task> {
        self.backend().create_task(task).await
    }

    pub async fn update_task(&self, id: Uuid, changes: &UpdateTaskRequest) -> ClientResult<Task> {
        self.backend().update_task(id, changes).await
    }

    pub async fn update_task_status(
        &self,
        id: Uuid,
        change: &UpdateTaskStatusRequest,
    ) -> ClientResult<Task> {
        self.backend().update_task_status(id, change).await
    }

    pub async fn delete_task(&self, id: Uuid) -> ClientResult<()> {
        self.backend().delete_task(id).await
    }

    pub async fn task_stats(&self) -> ClientResult<TaskStats> {
        if self.use_live() {
            if let Some(stats) = self.recovered("task stats", self.live.task_stats().await) {
                return Ok(stats);
            }
        }
        self.mock.task_stats().await
    }

    pub async fn list_notifications(
        &self,
        query: &NotificationListQuery,
    ) -> ClientResult<Vec<Notification>> {
        if self.use_live() {
            let result = self.live.list_notifications(query).await;
            if let Some(notifications) = self.recovered("notifications", result) {
                return Ok(notifications);
            }
        }
        self.mock.list_notifications(query).await
    }

    pub async fn unread_count(&self) -> ClientResult<i64> {
        if self.use_live() {
            if let Some(count) = self.recovered("unread count", self.live.unread_count().await) {
                return Ok(count);
            }
        }
        self.mock.unread_count().await
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> ClientResult<Notification> {
        self.backend().mark_notification_read(id).await
    }

    pub async fn mark_all_notifications_read(&self) -> ClientResult<()> {
        self.backend().mark_all_notifications_read().await
    }

    pub async fn delete_notification(&self, id: Uuid) -> ClientResult<()> {
        self.backend().delete_notification(id).await
    }

    pub async fn list_remarks(&self, query: &RemarkListQuery) -> ClientResult<Vec<Remark>> {
        if self.use_live() {
            if let Some(remarks) = self.recovered("remarks", self.live.list_remarks(query).await) {
                return Ok(remarks);
            }
        }
        self.mock.list_remarks(query).await
    }

    pub async fn add_remark(&self, remark: &CreateRemarkRequest) -> ClientResult<Remark> {
        self.backend().add_remark(remark).await
    }

    pub async fn respond_to_remark(&self, id: Uuid, response: &str) -> ClientResult<Remark> {
        self.backend().respond_to_remark(id, response).await
    }

    pub async fn delete_remark(&self, id: Uuid) -> ClientResult<()> {
        self.backend().delete_remark(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::ClientError;
    use crate::client::mock::seed;
    use crate::task::task_models::TaskCategory;
    use crate::user::user_models::Role;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn access(server: &MockServer) -> DataAccess {
        DataAccess::from_config(&ClientConfig {
            base_url: format!("{}/api", server.uri()),
            ws_url: "ws://127.0.0.1:9/ws".into(),
            force_mock: false,
            storage_dir: None,
        })
    }

    async fn healthy(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(server)
            .await;
    }

    fn admin_login() -> LoginRequest {
        LoginRequest {
            email: "admin@amc.com".into(),
            password: "admin123".into(),
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn test_health_probe_selects_mode() {
        let server = MockServer::start().await;
        let data = access(&server);
        assert_eq!(data.mode(), DataMode::Mock);
        assert_eq!(data.refresh_connectivity().await, DataMode::Mock);

        healthy(&server).await;
        assert_eq!(data.refresh_connectivity().await, DataMode::Live);

        data.connectivity().set_online(false);
        assert_eq!(data.mode(), DataMode::Mock);
    }

    #[tokio::test]
    async fn test_forced_mock_never_probes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let data = DataAccess::from_config(&ClientConfig {
            base_url: format!("{}/api", server.uri()),
            ..ClientConfig::default()
        });
        assert_eq!(data.refresh_connectivity().await, DataMode::Mock);

        let admin = data.login(&admin_login()).await.unwrap();
        assert_eq!(admin.id, seed::ADMIN_ID);
        assert!(data.subscribe(admin.id).is_none());
    }

    #[tokio::test]
    async fn test_failed_reads_fall_back_to_mock() {
        let server = MockServer::start().await;
        healthy(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let data = access(&server);
        data.refresh_connectivity().await;

        let users = data.list_users().await.unwrap();
        assert_eq!(users.len(), 5);
        assert_eq!(users[0].email, "admin@amc.com");
    }

    #[tokio::test]
    async fn test_failed_writes_do_not_fall_back() {
        let server = MockServer::start().await;
        healthy(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/tasks"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "success": false,
                "message": "Internal server error"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let data = access(&server);
        data.mock.login(&admin_login()).await.unwrap();
        data.refresh_connectivity().await;

        let err = data
            .create_task(&CreateTaskRequest {
                title: "Replace UPS battery".into(),
                description: None,
                category: TaskCategory::Monthly,
                priority: None,
                assigned_to: None,
                due_date: None,
                estimated_time: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Server(_)));
        assert_eq!(err.to_string(), "Internal server error");

        let local = data.mock.list_tasks(&TaskListQuery::default()).await.unwrap();
        assert_eq!(local.len(), 10);
    }

    #[tokio::test]
    async fn test_live_login_is_mirrored_locally() {
        let server = MockServer::start().await;
        healthy(&server).await;
        let user = UserResponse {
            id: Uuid::new_v4(),
            name: "Jane Smith".into(),
            email: "jane@amc.com".into(),
            role: Role::User,
            post: None,
            department: None,
            avatar_url: None,
            join_date: chrono::Utc::now(),
            last_login: None,
            is_active: true,
        };
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"user": user, "accessToken": "a", "refreshToken": "r"}
            })))
            .mount(&server)
            .await;

        let data = access(&server);
        data.refresh_connectivity().await;
        data.login(&LoginRequest {
            email: "jane@amc.com".into(),
            password: "jane123".into(),
            role: Role::User,
        })
        .await
        .unwrap();

        assert_eq!(data.mock.current_user().await.unwrap(), user);
        let subscription = data.subscribe(user.id);
        assert!(subscription.is_some());
    }
}
