use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::auth_dto::RegisterRequest;
use super::jwt::{TokenKeys, TokenKind, TokenPair};
use super::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::activity::{ActivityLogger, ActivityType, RequestMeta};
use crate::error::{AppError, Result};
use crate::user::user_models::{NewUser, ProfileChanges, Role, User};
use crate::user::user_repository::UserRepository;

/// An authenticated user together with a freshly issued token pair.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenKeys,
    activity: ActivityLogger,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: TokenKeys,
        activity: ActivityLogger,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            tokens,
            activity,
            bcrypt_cost,
        }
    }

    /// The stored role must equal the requested one. Every failure reads the
    /// same so that callers cannot probe which part was wrong.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Role,
        request: &RequestMeta,
    ) -> Result<AuthSession> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash) || user.role != role {
            return Err(invalid_credentials());
        }

        self.users.update_last_login(user.id).await?;
        let tokens = self.tokens.issue_pair(&user)?;

        self.activity
            .log(
                user.id,
                ActivityType::Login,
                "User logged in",
                json!({ "role": role }),
                request,
            )
            .await;

        tracing::info!("User {} logged in as {}", user.id, role);

        Ok(AuthSession { user, tokens })
    }

    pub async fn register(&self, req: RegisterRequest, request: &RequestMeta) -> Result<AuthSession> {
        let req = req.normalized();

        if self.users.email_exists(&req.email).await? {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&req.password, self.bcrypt_cost)?;
        let user = self
            .users
            .create(&NewUser {
                name: req.name,
                email: req.email,
                password_hash,
                role: req.role,
                post: req.post,
                department: req.department,
            })
            .await?;

        let tokens = self.tokens.issue_pair(&user)?;

        self.activity
            .log(
                user.id,
                ActivityType::UserRegistered,
                "User registered",
                json!({ "role": user.role }),
                request,
            )
            .await;

        Ok(AuthSession { user, tokens })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AppError::Authentication("Invalid refresh token".to_string()))?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

        self.tokens.issue_pair(&user)
    }

    /// Resolves an access token to the active user it was issued for.
    pub async fn authenticate(&self, access_token: &str) -> Result<User> {
        let claims = self.tokens.verify(access_token, TokenKind::Access)?;

        self.users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
        request: &RequestMeta,
    ) -> Result<User> {
        if changes.is_empty() {
            return self.me(user_id).await;
        }

        let user = self
            .users
            .update_profile(user_id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.activity
            .log(
                user_id,
                ActivityType::ProfileUpdated,
                "User updated profile",
                json!({ "changes": changes }),
                request,
            )
            .await;

        Ok(user)
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        request: &RequestMeta,
    ) -> Result<()> {
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let user = self.me(user_id).await?;
        if !verify_password(current_password, &user.password_hash) {
            return Err(AppError::Authentication(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(new_password, self.bcrypt_cost)?;
        self.users.update_password(user_id, &password_hash).await?;

        self.activity
            .log(
                user_id,
                ActivityType::PasswordChanged,
                "User changed password",
                json!({}),
                request,
            )
            .await;

        Ok(())
    }

    /// Tokens are stateless; logging out only leaves an audit entry.
    pub async fn logout(&self, user_id: Uuid, request: &RequestMeta) {
        self.activity
            .log(
                user_id,
                ActivityType::Logout,
                "User logged out",
                json!({}),
                request,
            )
            .await;
    }
}

fn invalid_credentials() -> AppError {
    AppError::Authentication("Invalid credentials".to_string())
}
