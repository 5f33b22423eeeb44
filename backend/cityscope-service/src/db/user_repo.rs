use super::{like_pattern, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{NewUser, ProfileUpdate, User};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, display_name, bio, location, \
                            profile_image_url, is_active, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique violation to the field that collided
fn conflict_from(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_unique") => {
                    AppError::Conflict("Email is already registered".to_string())
                }
                _ => AppError::Conflict("Username is already taken".to_string()),
            };
        }
    }
    AppError::from(err)
}

#[async_trait::async_trait]
impl UserRepository for PgUserRepository {
    async fn insert_user(&self, new_user: NewUser) -> Result<User> {
        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, display_name, bio, location,
                               profile_image_url, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, '', $6, '', TRUE, $7, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.display_name)
            .bind(&new_user.location)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_from)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_active_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE username = $1 AND is_active",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET bio = COALESCE($2, bio),
                location = COALESCE($3, location),
                updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(update.bio)
            .bind(update.location)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn search_active(&self, query: &str, limit: i64) -> Result<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE is_active AND username ILIKE $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2
            "#,
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(like_pattern(query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}
