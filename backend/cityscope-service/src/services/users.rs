/// User service - public profiles, search and profile updates
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, ProfileUpdate, User, UserProfile};
use crate::validation::trim_in_place;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Maximum number of search results
pub const SEARCH_LIMIT: i64 = 10;

/// Partial profile update; omitted fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(max = 150, message = "Bio cannot exceed 150 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 100, message = "Location cannot exceed 100 characters"))]
    pub location: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Active user by username
    pub async fn find_active(&self, username: &str) -> Result<User> {
        self.users
            .find_active_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_profile(&self, username: &str) -> Result<UserProfile> {
        let user = self.find_active(username).await?;
        Ok(UserProfile::from(&user))
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<CurrentUser> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|u| CurrentUser::from(&u))
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        mut input: UpdateProfileInput,
    ) -> Result<CurrentUser> {
        if let Some(bio) = input.bio.as_mut() {
            trim_in_place(bio);
        }
        if let Some(location) = input.location.as_mut() {
            trim_in_place(location);
        }
        input.validate()?;

        let user = self
            .users
            .update_profile(
                user_id,
                ProfileUpdate {
                    bio: input.bio,
                    location: input.location,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!(user_id = %user_id, "profile updated");
        Ok(CurrentUser::from(&user))
    }

    /// Case-insensitive username search over active users
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<UserProfile>> {
        let query = query.map(str::trim).unwrap_or_default();
        if query.chars().count() < 2 {
            return Err(AppError::invalid_field(
                "q",
                "Search query must be at least 2 characters",
            ));
        }

        let users = self.users.search_active(query, SEARCH_LIMIT).await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }
}
