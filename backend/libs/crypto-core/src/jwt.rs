/// Bearer token issuing and validation for CityScope services
///
/// Tokens are HS256 JWTs signed with a shared secret. The secret is held by a
/// [`JwtKeys`] value that services receive through their constructors; there is
/// no global key storage, so tests and multiple app instances can run with
/// different secrets side by side.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::JwtKeys;
/// use uuid::Uuid;
///
/// let keys = JwtKeys::new("0123456789abcdef0123456789abcdef", 24).unwrap();
/// let token = keys.issue(Uuid::new_v4(), "maria").unwrap();
/// let claims = keys.validate(&token).unwrap();
/// assert_eq!(claims.username, "maria");
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// JWT algorithm used for every CityScope token
const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Minimum secret length accepted for non-development deployments
pub const MIN_SECRET_BYTES: usize = 32;

/// Longest accepted token lifetime (one year)
pub const MAX_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret must not be empty")]
    EmptySecret,

    #[error("Token lifetime must be between 1 and {} hours", MAX_TTL_HOURS)]
    InvalidLifetime,

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Token expired")]
    Expired,

    #[error("Token invalid: {0}")]
    Invalid(String),
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Username at issue time
    pub username: String,
}

impl Claims {
    /// Parse the subject as a user ID
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| TokenError::Invalid(format!("subject is not a UUID: {e}")))
    }
}

/// Signing and verification keys plus the access-token lifetime
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"[REDACTED]")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish()
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if !(1..=MAX_TTL_HOURS).contains(&ttl_hours) {
            return Err(TokenError::InvalidLifetime);
        }
        let ttl = Duration::try_hours(ttl_hours).ok_or(TokenError::InvalidLifetime)?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Lifetime of issued tokens in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue an access token for a user
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::InvalidLifetime)?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            username: username.to_string(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate signature and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-32b";

    fn expired_token(secret: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            username: "old".to_string(),
        };
        encode(
            &Header::new(JWT_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_validate() {
        let keys = JwtKeys::new(SECRET, 1).unwrap();
        let user_id = Uuid::new_v4();

        let token = keys.issue(user_id, "alice").unwrap();
        assert_eq!(token.matches('.').count(), 2);

        let claims = keys.validate(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let keys = JwtKeys::new(SECRET, 1).unwrap();
        let other = JwtKeys::new("another-secret-that-is-also-32-bytes", 1).unwrap();

        let token = other.issue(Uuid::new_v4(), "mallory").unwrap();
        assert!(matches!(keys.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_rejects_expired_token() {
        let keys = JwtKeys::new(SECRET, 1).unwrap();
        let token = expired_token(SECRET);
        assert!(matches!(keys.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_rejects_garbage() {
        let keys = JwtKeys::new(SECRET, 1).unwrap();
        assert!(keys.validate("not.a.token").is_err());
        assert!(keys.validate("").is_err());
    }

    #[test]
    fn test_constructor_guards() {
        assert!(matches!(JwtKeys::new("", 1), Err(TokenError::EmptySecret)));
        assert!(matches!(
            JwtKeys::new(SECRET, 0),
            Err(TokenError::InvalidLifetime)
        ));
        assert!(JwtKeys::new(SECRET, MAX_TTL_HOURS).is_ok());
        for hours in [MAX_TTL_HOURS + 1, i64::MAX / 3600, i64::MAX] {
            assert!(matches!(
                JwtKeys::new(SECRET, hours),
                Err(TokenError::InvalidLifetime)
            ));
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let keys = JwtKeys::new(SECRET, 2).unwrap();
        let rendered = format!("{:?}", keys);
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("REDACTED"));
    }
}
