pub mod activity_handlers;
pub mod activity_logger;
pub mod activity_models;
pub mod activity_repository;

pub use activity_handlers::{get_activities, get_activity_stats};
pub use activity_logger::ActivityLogger;
pub use activity_models::{Activity, ActivityFilters, ActivityStat, ActivityType, RequestMeta};
pub use activity_repository::{ActivityRepository, PgActivityRepository};
