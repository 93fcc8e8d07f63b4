pub mod auth_dto;
pub mod auth_handlers;
pub mod auth_service;
pub mod jwt;
pub mod password;

pub use auth_dto::{AuthResponse, LoginRequest, RegisterRequest, RefreshTokenRequest, TokenPairResponse};
pub use auth_handlers::{change_password, login, logout, me, refresh_token, register, update_profile};
pub use auth_service::{AuthService, AuthSession};
pub use jwt::{Claims, TokenKeys, TokenKind, TokenPair};
pub use password::{hash_password, verify_password};
