use crate::error::{AppError, Result};
use crate::user::user_models::{Role, User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material and lifetimes for both token kinds.
#[derive(Clone)]
pub struct TokenKeys {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenKeys {
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    pub fn issue(&self, user: &User, kind: TokenKind) -> Result<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal("token expiry overflow".to_string()))?
            .timestamp();

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            typ: kind,
            iat: now.timestamp(),
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(kind).as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(user, TokenKind::Access)?,
            refresh_token: self.issue(user, TokenKind::Refresh)?,
        })
    }

    /// Verifies signature, expiry and that the token is of the expected kind.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind).as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

        if claims.typ != kind {
            return Err(AppError::Authentication("Invalid or expired token".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_user;

    fn keys() -> TokenKeys {
        TokenKeys::new("access-secret", "refresh-secret", Duration::minutes(15), Duration::days(7))
    }

    #[test]
    fn test_access_token_round_trip_carries_role() {
        let user = sample_user("admin@amc.com", Role::Admin);
        let token = keys().issue(&user, TokenKind::Access).unwrap();
        let claims = keys().verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.email, "admin@amc.com");
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let user = sample_user("john@amc.com", Role::User);
        let pair = keys().issue_pair(&user).unwrap();
        assert!(keys().verify(&pair.refresh_token, TokenKind::Access).is_err());
        assert!(keys().verify(&pair.access_token, TokenKind::Refresh).is_err());
        assert!(keys().verify(&pair.refresh_token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let user = sample_user("john@amc.com", Role::User);
        let expired = TokenKeys::new("a", "r", Duration::minutes(-5), Duration::days(7));
        let token = expired.issue(&user, TokenKind::Access).unwrap();
        assert!(matches!(
            expired.verify(&token, TokenKind::Access),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let user = sample_user("john@amc.com", Role::User);
        let other = TokenKeys::new("other", "other", Duration::minutes(15), Duration::days(7));
        let token = other.issue(&user, TokenKind::Access).unwrap();
        assert!(keys().verify(&token, TokenKind::Access).is_err());
    }
}
