use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Stored account, including credential material
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Always lower-cased
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub bio: String,
    pub location: String,
    pub profile_image_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub location: String,
}

/// Partial profile update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// Public user projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub location: String,
    pub profile_image_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            location: user.location.clone(),
            profile_image_url: user.profile_image_url.clone(),
            created_at: user.created_at,
        }
    }
}

/// Projection returned to the account owner
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            profile: UserProfile::from(user),
            email: user.email.clone(),
            updated_at: user.updated_at,
        }
    }
}

/// Author fields embedded in post and reply reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub profile_image_url: String,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projections_never_carry_password() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: "maria_g".into(),
            email: "maria@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            display_name: "Maria".into(),
            bio: String::new(),
            location: "Eastside".into(),
            profile_image_url: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let public = serde_json::to_value(UserProfile::from(&user)).unwrap();
        let own = serde_json::to_value(CurrentUser::from(&user)).unwrap();

        assert_eq!(public["displayName"], "Maria");
        assert!(public.get("email").is_none());
        assert_eq!(own["email"], "maria@example.com");
        for value in [public, own] {
            assert!(!value.to_string().contains("argon2"));
        }
    }
}
