use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::remark_models::RemarkType;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRemarkRequest {
    pub task_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2000, message = "Message is required"))]
    pub message: String,
    #[serde(rename = "type", default)]
    pub remark_type: RemarkType,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondRemarkRequest {
    #[validate(length(min = 1, max = 2000, message = "Response is required"))]
    pub response: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemarkListQuery {
    pub user_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub remark_type: Option<RemarkType>,
}
