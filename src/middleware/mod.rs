pub mod auth;
pub mod client_info;

pub use auth::{auth_middleware, authorize, require_admin, AuthUser};
