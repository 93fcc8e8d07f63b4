use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::user_models::{ProfileChanges, Role};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

// Admin DTOs
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    pub post: Option<String>,
    pub department: Option<String>,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
}

impl From<AdminUpdateUserRequest> for ProfileChanges {
    fn from(req: AdminUpdateUserRequest) -> Self {
        Self {
            name: req.name.map(|n| n.trim().to_string()),
            post: req.post,
            department: req.department,
            avatar_url: req.avatar_url,
        }
    }
}
