pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_models;
pub mod notification_repository;
pub mod notification_service;

pub use notification_handlers::{
    create_notification, delete_notification, get_notifications, get_unread_count,
    mark_all_notifications_read, mark_notification_read,
};
pub use notification_models::{NewNotification, Notification, NotificationType};
pub use notification_repository::{NotificationRepository, PgNotificationRepository};
pub use notification_service::{start_overdue_sweep, NotificationService};
