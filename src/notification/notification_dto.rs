use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::notification_models::{NewNotification, NotificationFilters, NotificationType};
use crate::task::task_models::Priority;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    pub priority: Option<Priority>,
    /// Defaults to the caller.
    pub user_id: Option<Uuid>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

impl CreateNotificationRequest {
    pub fn into_new(self, caller: Uuid) -> NewNotification {
        NewNotification {
            title: self.title,
            message: self.message,
            notification_type: self.notification_type.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            user_id: self.user_id.unwrap_or(caller),
            metadata: self.metadata.unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListQuery {
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
}

impl From<NotificationListQuery> for NotificationFilters {
    fn from(query: NotificationListQuery) -> Self {
        Self {
            unread_only: query.unread_only,
            notification_type: query.notification_type,
            limit: Some(query.limit.unwrap_or(50).clamp(1, 500)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let caller = Uuid::new_v4();
        let req: CreateNotificationRequest = serde_json::from_value(serde_json::json!({
            "title": "Reminder",
            "message": "Submit weekly report"
        }))
        .unwrap();

        let new = req.into_new(caller);
        assert_eq!(new.user_id, caller);
        assert_eq!(new.notification_type, NotificationType::SystemAlert);
        assert_eq!(new.priority, Priority::Medium);
    }

    #[test]
    fn test_list_query_defaults_limit() {
        let filters = NotificationFilters::from(NotificationListQuery::default());
        assert_eq!(filters.limit, Some(50));
        assert!(!filters.unread_only);
    }
}
