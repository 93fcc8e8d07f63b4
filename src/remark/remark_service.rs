use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    activity::{ActivityLogger, ActivityType, RequestMeta},
    error::{AppError, Result},
    middleware::AuthUser,
    remark::{
        remark_dto::{CreateRemarkRequest, RemarkListQuery},
        remark_models::{NewRemark, Remark, RemarkFilters},
        remark_repository::RemarkRepository,
    },
    task::task_repository::TaskRepository,
};

#[derive(Clone)]
pub struct RemarkService {
    remarks: Arc<dyn RemarkRepository>,
    tasks: Arc<dyn TaskRepository>,
    activity: ActivityLogger,
}

impl RemarkService {
    pub fn new(
        remarks: Arc<dyn RemarkRepository>,
        tasks: Arc<dyn TaskRepository>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            remarks,
            tasks,
            activity,
        }
    }

    /// Users see their own remarks; admins see all and may filter by author.
    pub async fn list(&self, caller: &AuthUser, query: RemarkListQuery) -> Result<Vec<Remark>> {
        let filters = RemarkFilters {
            user_id: if caller.is_admin() {
                query.user_id
            } else {
                Some(caller.id)
            },
            task_id: query.task_id,
            remark_type: query.remark_type,
        };

        self.remarks.find_all(&filters).await
    }

    pub async fn add(
        &self,
        caller: &AuthUser,
        req: CreateRemarkRequest,
        request: &RequestMeta,
    ) -> Result<Remark> {
        if let Some(task_id) = req.task_id {
            if self.tasks.find_by_id(task_id).await?.is_none() {
                return Err(AppError::Validation("Task not found".to_string()));
            }
        }

        let remark = self
            .remarks
            .create(&NewRemark {
                user_id: caller.id,
                task_id: req.task_id,
                message: req.message.trim().to_string(),
                remark_type: req.remark_type,
            })
            .await?;

        self.activity
            .log(
                caller.id,
                ActivityType::RemarkAdded,
                format!("Added {} remark", remark.remark_type),
                json!({ "remarkId": remark.id, "taskId": remark.task_id }),
                request,
            )
            .await;

        Ok(remark)
    }

    pub async fn respond(&self, id: Uuid, response: &str) -> Result<Remark> {
        self.remarks
            .respond(id, response.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("Remark not found".to_string()))
    }

    /// Authors may delete their own remarks; admins may delete any.
    pub async fn delete(&self, caller: &AuthUser, id: Uuid) -> Result<()> {
        let remark = self
            .remarks
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Remark not found".to_string()))?;

        if !caller.is_admin() && remark.user_id != caller.id {
            return Err(AppError::Forbidden(
                "You can only delete your own remarks".to_string(),
            ));
        }

        self.remarks.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remark::remark_models::RemarkType;
    use crate::testing::{sample_task, TestContext};
    use crate::user::user_models::Role;

    fn remark(task_id: Option<Uuid>, message: &str) -> CreateRemarkRequest {
        CreateRemarkRequest {
            task_id,
            message: message.into(),
            remark_type: RemarkType::Issue,
        }
    }

    #[tokio::test]
    async fn test_add_and_list_scoped_to_author() {
        let ctx = TestContext::new();
        let admin = ctx.add_user("admin@amc.com", Role::Admin).await;
        let john = ctx.add_user("john@amc.com", Role::User).await;
        let jane = ctx.add_user("jane@amc.com", Role::User).await;
        let task = sample_task("Projector check");
        ctx.tasks.insert(task.clone());
        let meta = RequestMeta::default();

        ctx.remark_service
            .add(&AuthUser::from(&john), remark(Some(task.id), "Projector flickers"), &meta)
            .await
            .unwrap();
        ctx.remark_service
            .add(&AuthUser::from(&jane), remark(None, "Need more cables"), &meta)
            .await
            .unwrap();
        assert_eq!(ctx.activities.count_of(ActivityType::RemarkAdded), 2);

        let johns = ctx
            .remark_service
            .list(
                &AuthUser::from(&john),
                RemarkListQuery {
                    user_id: Some(jane.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(johns.len(), 1);
        assert_eq!(johns[0].user_id, john.id);

        let all = ctx
            .remark_service
            .list(&AuthUser::from(&admin), RemarkListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_task() {
        let ctx = TestContext::new();
        let john = ctx.add_user("john@amc.com", Role::User).await;

        let err = ctx
            .remark_service
            .add(
                &AuthUser::from(&john),
                remark(Some(Uuid::new_v4()), "About a ghost task"),
                &RequestMeta::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_respond_and_delete_rules() {
        let ctx = TestContext::new();
        let john = ctx.add_user("john@amc.com", Role::User).await;
        let jane = ctx.add_user("jane@amc.com", Role::User).await;
        let created = ctx
            .remark_service
            .add(&AuthUser::from(&john), remark(None, "Door sensor loose"), &RequestMeta::default())
            .await
            .unwrap();

        let answered = ctx
            .remark_service
            .respond(created.id, "  Technician booked  ")
            .await
            .unwrap();
        assert_eq!(answered.admin_response.as_deref(), Some("Technician booked"));
        assert!(answered.responded_at.is_some());
        assert!(matches!(
            ctx.remark_service.respond(Uuid::new_v4(), "x").await,
            Err(AppError::NotFound(_))
        ));

        assert!(matches!(
            ctx.remark_service.delete(&AuthUser::from(&jane), created.id).await,
            Err(AppError::Forbidden(_))
        ));
        ctx.remark_service
            .delete(&AuthUser::from(&john), created.id)
            .await
            .unwrap();
    }
}
