use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use super::auth_dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
    TokenPairResponse, UpdateProfileRequest,
};
use super::auth_service::AuthSession;
use crate::{
    activity::RequestMeta,
    dto::ApiResponse,
    error::Result,
    extract::ApiJson,
    middleware::AuthUser,
    state::AppState,
    user::user_models::UserResponse,
};

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: session.user.into(),
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
        }
    }
}

/// Login with email, password and role
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    payload.validate()?;

    let session = state
        .auth_service
        .login(&payload.email, &payload.password, payload.role, &meta)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        session.into(),
    )))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "User with this email already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let session = state.auth_service.register(payload, &meta).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User registered successfully",
            AuthResponse::from(session),
        )),
    ))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = TokenPairResponse),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<TokenPairResponse>>> {
    let pair = state.auth_service.refresh(&payload.refresh_token).await?;

    Ok(Json(ApiResponse::with_message(
        "Token refreshed successfully",
        TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        },
    )))
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = state.auth_service.me(auth.id).await?;

    Ok(Json(ApiResponse::data(user.into())))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    payload.validate()?;

    let user = state
        .auth_service
        .update_profile(auth.id, payload.into(), &meta)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Profile updated successfully",
        user.into(),
    )))
}

/// Change the current user's password
#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is incorrect")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>> {
    payload.validate()?;

    state
        .auth_service
        .change_password(
            auth.id,
            &payload.current_password,
            &payload.new_password,
            &meta,
        )
        .await?;

    Ok(Json(ApiResponse::message("Password changed successfully")))
}

/// Logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out successfully"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    meta: RequestMeta,
) -> Json<ApiResponse<()>> {
    state.auth_service.logout(auth.id, &meta).await;

    Json(ApiResponse::message("Logout successful"))
}
