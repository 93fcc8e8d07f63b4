use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::user_models::{NewUser, ProfileChanges, Role, User};
use crate::error::Result;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<User>;
    /// Active users only.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// Active users only.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Checks active and deactivated rows alike.
    async fn email_exists(&self, email: &str) -> Result<bool>;
    async fn find_all(&self, role: Option<Role>) -> Result<Vec<User>>;
    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<User>>;
    async fn update_last_login(&self, id: Uuid) -> Result<()>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;
    async fn deactivate(&self, id: Uuid) -> Result<u64>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash, role, post, department)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.post)
        .bind(&user.department)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active = true")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND is_active = true")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn find_all(&self, role: Option<Role>) -> Result<Vec<User>> {
        let mut query = String::from("SELECT * FROM users");
        if role.is_some() {
            query.push_str(" WHERE role = $1");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, User>(&query);
        if let Some(role) = role {
            q = q.bind(role);
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET
                name = COALESCE($2, name),
                post = COALESCE($3, post),
                department = COALESCE($4, department),
                avatar_url = COALESCE($5, avatar_url),
                updated_at = NOW()
             WHERE id = $1 AND is_active = true
             RETURNING *",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.post)
        .bind(&changes.department)
        .bind(&changes.avatar_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_last_login(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE users SET is_active = false, updated_at = NOW() WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
