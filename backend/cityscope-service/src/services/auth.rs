/// Account registration, login and bearer-token authentication
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, NewUser, User};
use crate::validation::{trim_in_place, validate_username_chars};
use crypto_core::{hash_password, verify_password, JwtKeys, TokenError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Why a request could not be authenticated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    #[error("Not authorized - no token provided")]
    MissingToken,

    #[error("Not authorized - invalid token")]
    InvalidToken,

    #[error("Not authorized - user not found")]
    UnknownUser,

    #[error("Account is deactivated")]
    Deactivated,

    /// The credential store could not be consulted
    #[error("credential lookup failed: {0}")]
    Unavailable(String),
}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::Unavailable(detail) => AppError::Internal(detail),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterInput {
    #[serde(default)]
    #[validate(
        length(min = 3, max = 30, message = "Username must be 3-30 characters"),
        custom(function = "validate_username_chars")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 100, message = "Name cannot exceed 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 100, message = "Location cannot exceed 100 characters"))]
    pub location: Option<String>,
}

impl RegisterInput {
    fn normalize(&mut self) {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.email);
        self.email = self.email.to_lowercase();
        if let Some(name) = self.name.as_mut() {
            trim_in_place(name);
        }
        if let Some(location) = self.location.as_mut() {
            trim_in_place(location);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginInput {
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// A user together with a freshly issued bearer token
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: CurrentUser,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        Ok(AuthSession {
            user: CurrentUser::from(user),
            token: self.keys.issue(user.id, &user.username)?,
        })
    }

    pub async fn register(&self, mut input: RegisterInput) -> Result<AuthSession> {
        input.normalize();
        input.validate()?;

        let password_hash = hash_password(&input.password)?;
        let display_name = input
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| input.username.clone());

        let user = self
            .users
            .insert_user(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
                display_name,
                location: input.location.unwrap_or_default(),
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        self.session_for(&user)
    }

    pub async fn login(&self, mut input: LoginInput) -> Result<AuthSession> {
        input.email = input.email.trim().to_lowercase();
        input.validate()?;

        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());
        let user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &user.password_hash)? {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(invalid());
        }
        if !user.is_active {
            return Err(AuthRejection::Deactivated.into());
        }

        info!(user_id = %user.id, "user logged in");
        self.session_for(&user)
    }

    /// Resolve a bearer token to an active user
    pub async fn authenticate(&self, token: &str) -> std::result::Result<User, AuthRejection> {
        let claims = self.keys.validate(token).map_err(|e| {
            if !matches!(e, TokenError::Expired) {
                warn!(error = %e, "bearer token rejected");
            }
            AuthRejection::InvalidToken
        })?;
        let user_id: Uuid = claims.user_id().map_err(|_| AuthRejection::InvalidToken)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthRejection::Unavailable(e.to_string()))?
            .ok_or(AuthRejection::UnknownUser)?;

        if !user.is_active {
            return Err(AuthRejection::Deactivated);
        }
        Ok(user)
    }
}
