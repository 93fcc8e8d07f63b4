use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    activity::{ActivityLogger, ActivityType, RequestMeta},
    error::{AppError, Result},
    user::{
        user_models::{ProfileChanges, Role, User},
        user_repository::UserRepository,
    },
};

/// Administrative user management. Users are never deleted, only deactivated.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    activity: ActivityLogger,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, activity: ActivityLogger) -> Self {
        Self { users, activity }
    }

    pub async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        self.users.find_all(role).await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update(
        &self,
        admin_id: Uuid,
        id: Uuid,
        changes: ProfileChanges,
        request: &RequestMeta,
    ) -> Result<User> {
        let target = self.get(id).await?;
        if changes.is_empty() {
            return Ok(target);
        }

        let updated = self
            .users
            .update_profile(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.activity
            .log(
                admin_id,
                ActivityType::ProfileUpdated,
                format!("Admin updated user profile: {}", target.name),
                json!({ "targetUserId": id, "updates": changes }),
                request,
            )
            .await;

        Ok(updated)
    }

    pub async fn deactivate(&self, admin_id: Uuid, id: Uuid, request: &RequestMeta) -> Result<()> {
        if admin_id == id {
            return Err(AppError::Validation(
                "You cannot deactivate your own account".to_string(),
            ));
        }

        let target = self.get(id).await?;
        if self.users.deactivate(id).await? == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.activity
            .log(
                admin_id,
                ActivityType::UserDeactivated,
                format!("Admin deactivated user: {}", target.name),
                json!({ "targetUserId": id }),
                request,
            )
            .await;

        tracing::info!("User {} deactivated by {}", id, admin_id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn test_list_filters_by_role() {
        let ctx = TestContext::new();
        ctx.add_user("admin@amc.com", Role::Admin).await;
        ctx.add_user("john@amc.com", Role::User).await;
        ctx.add_user("jane@amc.com", Role::User).await;

        assert_eq!(ctx.user_service.list(None).await.unwrap().len(), 3);
        let admins = ctx.user_service.list(Some(Role::Admin)).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].email, "admin@amc.com");
    }

    #[tokio::test]
    async fn test_admin_cannot_deactivate_self() {
        let ctx = TestContext::new();
        let admin = ctx.add_user("admin@amc.com", Role::Admin).await;

        let err = ctx
            .user_service
            .deactivate(admin.id, admin.id, &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(ctx.users.get(admin.id).unwrap().is_active);
    }

    #[tokio::test]
    async fn test_deactivate_hides_user_and_logs() {
        let ctx = TestContext::new();
        let admin = ctx.add_user("admin@amc.com", Role::Admin).await;
        let john = ctx.add_user("john@amc.com", Role::User).await;
        let meta = RequestMeta::default();

        ctx.user_service.deactivate(admin.id, john.id, &meta).await.unwrap();

        assert!(matches!(
            ctx.user_service.get(john.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(ctx.activities.count_of(ActivityType::UserDeactivated), 1);
        assert!(matches!(
            ctx.user_service.deactivate(admin.id, john.id, &meta).await,
            Err(AppError::NotFound(_))
        ));
    }
}
