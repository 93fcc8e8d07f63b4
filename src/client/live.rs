use std::{sync::RwLock, time::Duration};

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::auth_dto::{
        AuthResponse, ChangePasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
        TokenPairResponse, UpdateProfileRequest,
    },
    client::{
        api::{ClientError, ClientResult, PortalBackend},
        realtime::TokenSource,
    },
    dto::{ApiResponse, PaginatedResponse},
    notification::{
        notification_dto::{NotificationListQuery, UnreadCountResponse},
        notification_models::Notification,
    },
    remark::{
        remark_dto::{CreateRemarkRequest, RemarkListQuery, RespondRemarkRequest},
        remark_models::Remark,
    },
    task::{
        task_dto::{CreateTaskRequest, TaskListQuery, UpdateTaskRequest, UpdateTaskStatusRequest},
        task_models::{Task, TaskStats},
    },
    user::user_models::UserResponse,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for the portal API. The token pair lives in memory only.
pub struct LiveBackend {
    http: reqwest::Client,
    base_url: String,
    tokens: RwLock<Option<TokenPairResponse>>,
}

impl LiveBackend {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn tokens(&self) -> Option<TokenPairResponse> {
        match self.tokens.read() {
            Ok(tokens) => tokens.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_tokens(&self, tokens: Option<TokenPairResponse>) {
        match self.tokens.write() {
            Ok(mut slot) => *slot = tokens,
            Err(poisoned) => *poisoned.into_inner() = tokens,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens().map(|t| t.access_token)
    }

    /// True when `GET /health` answers 2xx within three seconds.
    pub async fn check_health(&self) -> bool {
        match self
            .http
            .get(self.url("/health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Health check failed: {}", e);
                false
            }
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends an authenticated request. A 401 triggers one token refresh and
    /// one retry.
    async fn send<F>(&self, build: F) -> ClientResult<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder + Send + Sync,
    {
        let response = self.authorized(build(&self.http)).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED || !self.refresh().await? {
            return Ok(response);
        }

        Ok(self.authorized(build(&self.http)).send().await?)
    }

    async fn refresh(&self) -> ClientResult<bool> {
        let Some(refresh_token) = self.tokens().map(|t| t.refresh_token) else {
            return Ok(false);
        };

        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&RefreshTokenRequest { refresh_token })
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Token refresh rejected with {}", response.status());
            self.set_tokens(None);
            return Ok(false);
        }

        let pair: TokenPairResponse = Self::data(response).await?;
        self.set_tokens(Some(pair));
        Ok(true)
    }

    async fn body<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message);
            return Err(ClientError::from_status(status.as_u16(), message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn data<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let envelope: ApiResponse<T> = Self::body(response).await?;
        envelope
            .data
            .ok_or_else(|| ClientError::Decode("response carried no data".to_string()))
    }

    async fn done(response: Response) -> ClientResult<()> {
        Self::body::<Value>(response).await.map(|_| ())
    }

    async fn start_session(&self, response: Response) -> ClientResult<UserResponse> {
        let auth: AuthResponse = Self::data(response).await?;
        self.set_tokens(Some(TokenPairResponse {
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
        }));
        Ok(auth.user)
    }
}

#[async_trait]
impl TokenSource for LiveBackend {
    fn access_token(&self) -> Option<String> {
        LiveBackend::access_token(self)
    }

    async fn renew(&self) -> bool {
        match self.refresh().await {
            Ok(renewed) => renewed,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl PortalBackend for LiveBackend {
    async fn login(&self, credentials: &LoginRequest) -> ClientResult<UserResponse> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await?;
        self.start_session(response).await
    }

    async fn signup(&self, registration: &RegisterRequest) -> ClientResult<UserResponse> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(registration)
            .send()
            .await?;
        self.start_session(response).await
    }

    async fn current_user(&self) -> ClientResult<UserResponse> {
        let response = self.send(|http| http.get(self.url("/auth/me"))).await?;
        Self::data(response).await
    }

    async fn update_profile(&self, changes: &UpdateProfileRequest) -> ClientResult<UserResponse> {
        let response = self
            .send(|http| http.put(self.url("/auth/profile")).json(changes))
            .await?;
        Self::data(response).await
    }

    async fn change_password(&self, request: &ChangePasswordRequest) -> ClientResult<()> {
        let response = self
            .send(|http| http.put(self.url("/auth/change-password")).json(request))
            .await?;
        Self::done(response).await
    }

    /// Local tokens are dropped even when the server call fails.
    async fn logout(&self) -> ClientResult<()> {
        let result = match self.send(|http| http.post(self.url("/auth/logout"))).await {
            Ok(response) => Self::done(response).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!("Server logout failed: {}", e);
        }
        self.set_tokens(None);
        Ok(())
    }

    async fn list_users(&self) -> ClientResult<Vec<UserResponse>> {
        let response = self.send(|http| http.get(self.url("/users"))).await?;
        Self::data(response).await
    }

    async fn list_tasks(&self, query: &TaskListQuery) -> ClientResult<Vec<Task>> {
        let response = self
            .send(|http| http.get(self.url("/tasks")).query(query))
            .await?;
        let page: PaginatedResponse<Task> = Self::body(response).await?;
        Ok(page.data)
    }

    async fn get_task(&self, id: Uuid) -> ClientResult<Task> {
        let path = format!("/tasks/{}", id);
        let response = self.send(|http| http.get(self.url(&path))).await?;
        Self::data(response).await
    }

    async fn create_task(&self, task: &CreateTaskRequest) -> ClientResult<Task> {
        let response = self
            .send(|http| http.post(self.url("/tasks")).json(task))
            .await?;
        Self::data(response).await
    }

    async fn update_task(&self, id: Uuid, changes: &UpdateTaskRequest) -> ClientResult<Task> {
        let path = format!("/tasks/{}", id);
        let response = self
            .send(|http| http.put(self.url(&path)).json(changes))
            .await?;
        Self::data(response).await
    }

    async fn update_task_status(
        &self,
        id: Uuid,
        change: &UpdateTaskStatusRequest,
    ) -> ClientResult<Task> {
        let path = format!("/tasks/{}/status", id);
        let response = self
            .send(|http| http.patch(self.url(&path)).json(change))
            .await?;
        Self::data(response).await
    }

    async fn delete_task(&self, id: Uuid) -> ClientResult<()> {
        let path = format!("/tasks/{}", id);
        let response = self.send(|http| http.delete(self.url(&path))).await?;
        Self::done(response).await
    }

    async fn task_stats(&self) -> ClientResult<TaskStats> {
        let response = self.send(|http| http.get(self.url("/tasks/stats"))).await?;
        Self::data(response).await
    }

    async fn list_notifications(
        &self,
        query: &NotificationListQuery,
    ) -> ClientResult<Vec<Notification>> {
        let response = self
            .send(|http| http.get(self.url("/notifications")).query(query))
            .await?;
        Self::data(response).await
    }

    async fn unread_count(&self) -> ClientResult<i64> {
        let response = self
            .send(|http| http.get(self.url("/notifications/unread-count")))
            .await?;
        let count: UnreadCountResponse = Self::data(response).await?;
        Ok(count.unread_count)
    }

    async fn mark_notification_read(&self, id: Uuid) -> ClientResult<Notification> {
        let path = format!("/notifications/{}/read", id);
        let response = self.send(|http| http.patch(self.url(&path))).await?;
        Self::data(response).await
    }

    async fn mark_all_notifications_read(&self) -> ClientResult<()> {
        let response = self
            .send(|http| http.patch(self.url("/notifications/read-all")))
            .await?;
        Self::done(response).await
    }

    async fn delete_notification(&self, id: Uuid) -> ClientResult<()> {
        let path = format!("/notifications/{}", id);
        let response = self.send(|http| http.delete(self.url(&path))).await?;
        Self::done(response).await
    }

    async fn list_remarks(&self, query: &RemarkListQuery) -> ClientResult<Vec<Remark>> {
        let response = self
            .send(|http| http.get(self.url("/remarks")).query(query))
            .await?;
        Self::data(response).await
    }

    async fn add_remark(&self, remark: &CreateRemarkRequest) -> ClientResult<Remark> {
        let response = self
            .send(|http| http.post(self.url("/remarks")).json(remark))
            .await?;
        Self::data(response).await
    }

    async fn respond_to_remark(&self, id: Uuid, response: &str) -> ClientResult<Remark> {
        let path = format!("/remarks/{}/respond", id);
        let body = RespondRemarkRequest {
            response: response.to_string(),
        };
        let response = self
            .send(|http| http.patch(self.url(&path)).json(&body))
            .await?;
        Self::data(response).await
    }

    async fn delete_remark(&self, id: Uuid) -> ClientResult<()> {
        let path = format!("/remarks/{}", id);
        let response = self.send(|http| http.delete(self.url(&path))).await?;
        Self::done(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::task_models::TaskCategory;
    use crate::user::user_models::Role;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn user_json(role: Role) -> Value {
        serde_json::to_value(UserResponse {
            id: Uuid::new_v4(),
            name: "Admin User".into(),
            email: "admin@amc.com".into(),
            role,
            post: None,
            department: None,
            avatar_url: None,
            join_date: Utc::now(),
            last_login: None,
            is_active: true,
        })
        .unwrap()
    }

    fn backend(server: &MockServer) -> LiveBackend {
        LiveBackend::new(format!("{}/api", server.uri()))
    }

    #[tokio::test]
    async fn test_login_keeps_tokens_for_later_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Login successful",
                "data": {
                    "user": user_json(Role::Admin),
                    "accessToken": "access-1",
                    "refreshToken": "refresh-1"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [],
                "pagination": {"page": 1, "limit": 50, "total": 0}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = backend(&server);
        let user = client
            .login(&LoginRequest {
                email: "admin@amc.com".into(),
                password: "admin123".into(),
                role: Role::Admin,
            })
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(client.access_token().as_deref(), Some("access-1"));

        let tasks = client.list_tasks(&TaskListQuery::default()).await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_request_refreshes_once_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "message": "Invalid or expired token"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .and(body_json(json!({"refreshToken": "refresh-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"accessToken": "fresh", "refreshToken": "refresh-2"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": user_json(Role::User)})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = backend(&server);
        client.set_tokens(Some(TokenPairResponse {
            access_token: "stale".into(),
            refresh_token: "refresh-1".into(),
        }));

        let me = client.current_user().await.unwrap();
        assert_eq!(me.role, Role::User);
        let tokens = client.tokens().unwrap();
        assert_eq!(tokens.access_token, "fresh");
        assert_eq!(tokens.refresh_token, "refresh-2");
    }

    #[tokio::test]
    async fn test_rejected_refresh_surfaces_unauthorized_and_clears_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks/stats"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "message": "Invalid or expired token"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "message": "Invalid refresh token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = backend(&server);
        client.set_tokens(Some(TokenPairResponse {
            access_token: "stale".into(),
            refresh_token: "expired".into(),
        }));

        let err = client.task_stats().await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized(_)));
        assert_eq!(err.to_string(), "Invalid or expired token");
        assert!(client.tokens().is_none());
    }

    #[tokio::test]
    async fn test_renewal_hands_the_realtime_channel_a_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .and(body_json(json!({"refreshToken": "refresh-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"accessToken": "access-2", "refreshToken": "refresh-2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = backend(&server);
        assert!(!TokenSource::renew(&client).await);

        client.set_tokens(Some(TokenPairResponse {
            access_token: "access-1".into(),
            refresh_token: "refresh-1".into(),
        }));
        assert!(TokenSource::renew(&client).await);
        assert_eq!(TokenSource::access_token(&client).as_deref(), Some("access-2"));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tasks"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Assigned user not found"
            })))
            .mount(&server)
            .await;
        let doomed = Uuid::new_v4();
        Mock::given(method("DELETE"))
            .and(path(format!("/api/tasks/{}", doomed)))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = backend(&server);
        let err = client.delete_task(doomed).await.unwrap_err();
        assert!(matches!(err, ClientError::Server(_)));
        assert_eq!(err.to_string(), "Server error (500). Please try again later.");

        let err = client
            .create_task(&CreateTaskRequest {
                title: "Check UPS".into(),
                description: None,
                category: TaskCategory::Weekly,
                priority: None,
                assigned_to: Some(Uuid::new_v4()),
                due_date: None,
                estimated_time: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(err.to_string(), "Assigned user not found");
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        assert!(backend(&server).check_health().await);
        assert!(!LiveBackend::new("http://127.0.0.1:9/api").check_health().await);
    }
}
