use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::activity_models::{ActivityType, NewActivity, RequestMeta};
use super::activity_repository::ActivityRepository;

/// Writes audit entries. Failures are logged and swallowed so that an audit
/// problem never fails the operation being audited.
#[derive(Clone)]
pub struct ActivityLogger {
    repo: Arc<dyn ActivityRepository>,
}

impl ActivityLogger {
    pub fn new(repo: Arc<dyn ActivityRepository>) -> Self {
        Self { repo }
    }

    pub async fn log(
        &self,
        user_id: Uuid,
        activity_type: ActivityType,
        description: impl Into<String>,
        metadata: Value,
        request: &RequestMeta,
    ) {
        let activity = NewActivity {
            user_id,
            activity_type,
            description: description.into(),
            metadata,
            request: request.clone(),
        };

        if let Err(e) = self.repo.record(&activity).await {
            tracing::warn!(
                "Failed to log {} activity for user {}: {}",
                activity_type,
                user_id,
                e
            );
        }
    }
}
