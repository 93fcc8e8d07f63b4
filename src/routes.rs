use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    activity::{self, Activity, ActivityStat, ActivityType},
    auth::{
        self,
        auth_dto::{ChangePasswordRequest, UpdateProfileRequest},
        AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest, TokenPairResponse,
    },
    dto::Pagination,
    middleware::{auth_middleware, require_admin},
    notification::{
        self,
        notification_dto::{CreateNotificationRequest, UnreadCountResponse},
        Notification, NotificationType,
    },
    remark::{
        self,
        remark_dto::{CreateRemarkRequest, RespondRemarkRequest},
        Remark, RemarkType,
    },
    state::AppState,
    task::{
        self,
        task_dto::{CreateTaskRequest, UpdateTaskRequest, UpdateTaskStatusRequest},
        Priority, Task, TaskCategory, TaskStats, TaskStatus,
    },
    user::{self, user_dto::AdminUpdateUserRequest, Role, UserResponse},
    websocket::ws_handler,
};

const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        auth::auth_handlers::login,
        auth::auth_handlers::register,
        auth::auth_handlers::refresh_token,
        auth::auth_handlers::me,
        auth::auth_handlers::update_profile,
        auth::auth_handlers::change_password,
        auth::auth_handlers::logout,
        task::task_handlers::get_tasks,
        task::task_handlers::get_task,
        task::task_handlers::create_task,
        task::task_handlers::update_task,
        task::task_handlers::update_task_status,
        task::task_handlers::delete_task,
        task::task_handlers::get_task_stats,
        notification::notification_handlers::get_notifications,
        notification::notification_handlers::get_unread_count,
        notification::notification_handlers::create_notification,
        notification::notification_handlers::mark_notification_read,
        notification::notification_handlers::mark_all_notifications_read,
        notification::notification_handlers::delete_notification,
        user::user_handlers::get_users,
        user::user_handlers::get_user,
        user::user_handlers::update_user,
        user::user_handlers::deactivate_user,
        activity::activity_handlers::get_activities,
        activity::activity_handlers::get_activity_stats,
        remark::remark_handlers::get_remarks,
        remark::remark_handlers::create_remark,
        remark::remark_handlers::respond_to_remark,
        remark::remark_handlers::delete_remark,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            RegisterRequest,
            AuthResponse,
            RefreshTokenRequest,
            TokenPairResponse,
            ChangePasswordRequest,
            UpdateProfileRequest,
            AdminUpdateUserRequest,
            UserResponse,
            Role,
            Task,
            TaskStatus,
            TaskCategory,
            Priority,
            TaskStats,
            CreateTaskRequest,
            UpdateTaskRequest,
            UpdateTaskStatusRequest,
            Pagination,
            Notification,
            NotificationType,
            CreateNotificationRequest,
            UnreadCountResponse,
            Activity,
            ActivityType,
            ActivityStat,
            Remark,
            RemarkType,
            CreateRemarkRequest,
            RespondRemarkRequest,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "tasks", description = "Task management endpoints"),
        (name = "notifications", description = "Notification endpoints"),
        (name = "users", description = "User administration endpoints"),
        (name = "activities", description = "Activity log endpoints"),
        (name = "remarks", description = "Remark endpoints")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub version: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Server is running", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "AMC Portal API is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match frontend_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("FRONTEND_URL is not a valid origin; allowing any origin");
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.frontend_url.as_deref());

    let authenticated = middleware::from_fn_with_state(state.clone(), auth_middleware);

    // Public routes (no auth required)
    let public_auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh_token));

    let auth_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/profile", put(auth::update_profile))
        .route("/change-password", put(auth::change_password))
        .route("/logout", post(auth::logout))
        .route_layer(authenticated.clone())
        .merge(public_auth_routes);

    let task_routes = Router::new()
        .route("/", get(task::get_tasks).post(task::create_task))
        .route("/stats", get(task::get_task_stats))
        .route(
            "/:id",
            get(task::get_task)
                .put(task::update_task)
                .delete(task::delete_task),
        )
        .route("/:id/status", patch(task::update_task_status))
        .route_layer(authenticated.clone());

    let notification_routes = Router::new()
        .route(
            "/",
            get(notification::get_notifications).post(notification::create_notification),
        )
        .route("/unread-count", get(notification::get_unread_count))
        .route("/read-all", patch(notification::mark_all_notifications_read))
        .route("/:id/read", patch(notification::mark_notification_read))
        .route("/:id", delete(notification::delete_notification))
        .route_layer(authenticated.clone());

    // Admin routes: auth runs first, then the role check
    let user_routes = Router::new()
        .route("/", get(user::get_users))
        .route(
            "/:id",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::deactivate_user),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(authenticated.clone());

    let activity_routes = Router::new()
        .route("/", get(activity::get_activities))
        .route("/stats", get(activity::get_activity_stats))
        .route_layer(authenticated.clone());

    let remark_admin_routes = Router::new()
        .route("/:id/respond", patch(remark::respond_to_remark))
        .route_layer(middleware::from_fn(require_admin));

    let remark_routes = Router::new()
        .route("/", get(remark::get_remarks).post(remark::create_remark))
        .route("/:id", delete(remark::delete_remark))
        .merge(remark_admin_routes)
        .route_layer(authenticated);

    let api_routes = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/notifications", notification_routes)
        .nest("/users", user_routes)
        .nest("/activities", activity_routes)
        .nest("/remarks", remark_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestContext, SEED_PASSWORD};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let ctx = TestContext::new();
        for uri in ["/health", "/api/health"] {
            let (status, body) = send(create_router(ctx.state.clone()), get_request(uri, None)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
            assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        }
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let ctx = TestContext::new();
        let (status, body) =
            send(create_router(ctx.state.clone()), get_request("/api/tasks", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Access token is required");

        let (status, _) = send(
            create_router(ctx.state.clone()),
            get_request("/api/tasks", Some("not-a-jwt")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_then_create_task() {
        let ctx = TestContext::new();
        let admin = ctx.add_user("admin@amc.com", Role::Admin).await;
        let login = json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"email": "admin@amc.com", "password": SEED_PASSWORD, "role": "admin"}),
        );
        let (status, body) = send(create_router(ctx.state.clone()), login).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["id"], json!(admin.id));
        let token = body["data"]["accessToken"].as_str().unwrap().to_string();

        let create = json_request(
            "POST",
            "/api/tasks",
            Some(&token),
            json!({"title": "Check lifts", "category": "daily", "priority": "high"}),
        );
        let (status, body) = send(create_router(ctx.state.clone()), create).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["assignedBy"], json!(admin.id));

        let (status, body) = send(
            create_router(ctx.state.clone()),
            get_request("/api/tasks?limit=10&page=2", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"], json!({"page": 2, "limit": 10, "total": 1}));
    }

    #[tokio::test]
    async fn test_login_with_wrong_role_is_unauthorized() {
        let ctx = TestContext::new();
        ctx.add_user("john@amc.com", Role::User).await;
        let login = json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"email": "john@amc.com", "password": SEED_PASSWORD, "role": "admin"}),
        );
        let (status, body) = send(create_router(ctx.state.clone()), login).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_admin_routes_reject_regular_users() {
        let ctx = TestContext::new();
        let john = ctx.add_user("john@amc.com", Role::User).await;
        let token = ctx.tokens.issue_pair(&john).unwrap().access_token;

        let (status, body) = send(
            create_router(ctx.state.clone()),
            get_request("/api/users", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Insufficient permissions");

        let respond = json_request(
            "PATCH",
            &format!("/api/remarks/{}/respond", uuid::Uuid::new_v4()),
            Some(&token),
            json!({"response": "ok"}),
        );
        let (status, _) = send(create_router(ctx.state.clone()), respond).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_validation_errors_list_fields() {
        let ctx = TestContext::new();
        let register = json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({"name": "J", "email": "not-an-email", "password": "123", "role": "user"}),
        );
        let (status, body) = send(create_router(ctx.state.clone()), register).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "name", "password"]);
    }

    #[tokio::test]
    async fn test_malformed_input_uses_error_envelope() {
        let ctx = TestContext::new();
        let admin = ctx.add_user("admin@amc.com", Role::Admin).await;
        let token = ctx.tokens.issue_pair(&admin).unwrap().access_token;

        let status_change = json_request(
            "PATCH",
            &format!("/api/tasks/{}/status", uuid::Uuid::new_v4()),
            Some(&token),
            json!({"status": "archived"}),
        );
        let (status, body) = send(create_router(ctx.state.clone()), status_change).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("archived"));

        let (status, body) = send(
            create_router(ctx.state.clone()),
            get_request("/api/tasks?status=bogus", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let garbled = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\":"))
            .unwrap();
        let (status, body) = send(create_router(ctx.state.clone()), garbled).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
