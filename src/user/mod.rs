pub mod user_dto;
pub mod user_handlers;
pub mod user_models;
pub mod user_repository;
pub mod user_service;

pub use user_handlers::{deactivate_user, get_user, get_users, update_user};
pub use user_models::{ProfileChanges, Role, User, UserResponse};
pub use user_repository::{PgUserRepository, UserRepository};
pub use user_service::UserService;
