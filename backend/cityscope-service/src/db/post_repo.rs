use super::{like_pattern, PostRepository};
use crate::error::{AppError, Result};
use crate::models::{
    AuthorSummary, NewPost, PageRequest, Post, PostFilter, PostView, ReactionKind,
    ReactionOutcome, ReactionState,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Columns of a post joined with its author and reaction counts
const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.text_content, p.post_type, p.image_url, p.image_id,
           p.location_text, p.reply_count, p.is_active, p.created_at, p.updated_at,
           u.username AS author_username,
           u.display_name AS author_display_name,
           u.profile_image_url AS author_profile_image_url,
           (SELECT COUNT(*) FROM post_reactions r WHERE r.post_id = p.id AND r.kind = 'like')
               AS like_count,
           (SELECT COUNT(*) FROM post_reactions r WHERE r.post_id = p.id AND r.kind = 'dislike')
               AS dislike_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

/// Optional filters bound as $1 post_type, $2 location pattern, $3 author id
const FEED_FILTER: &str = r#"
    WHERE p.is_active
      AND ($1::text IS NULL OR p.post_type = $1)
      AND ($2::text IS NULL OR p.location_text ILIKE $2)
      AND ($3::uuid IS NULL OR p.author_id = $3)
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostViewRow {
    id: Uuid,
    author_id: Uuid,
    text_content: String,
    post_type: String,
    image_url: Option<String>,
    image_id: Option<String>,
    location_text: String,
    reply_count: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_username: String,
    author_display_name: String,
    author_profile_image_url: String,
    like_count: i64,
    dislike_count: i64,
}

impl TryFrom<PostViewRow> for PostView {
    type Error = AppError;

    fn try_from(row: PostViewRow) -> Result<Self> {
        let post_type = row
            .post_type
            .parse()
            .map_err(|e: String| AppError::Internal(format!("post {}: {}", row.id, e)))?;
        let author = AuthorSummary {
            id: row.author_id,
            username: row.author_username,
            display_name: row.author_display_name,
            profile_image_url: row.author_profile_image_url,
        };
        let post = Post {
            id: row.id,
            author_id: row.author_id,
            text_content: row.text_content,
            post_type,
            image_url: row.image_url,
            image_id: row.image_id,
            location_text: row.location_text,
            reply_count: row.reply_count,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Ok(PostView::from_parts(post, author, row.like_count, row.dislike_count))
    }
}

fn parse_kind(raw: &str) -> Result<ReactionKind> {
    raw.parse()
        .map_err(|e: String| AppError::Internal(format!("post_reactions: {}", e)))
}

pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostRepository for PgPostRepository {
    async fn insert_post(&self, new_post: NewPost) -> Result<PostView> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let (image_url, image_id) = match new_post.image {
            Some((url, image_id)) => (Some(url), Some(image_id)),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, text_content, post_type, image_url, image_id,
                               location_text, reply_count, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, TRUE, $8, $8)
            "#,
        )
        .bind(id)
        .bind(new_post.author_id)
        .bind(&new_post.text_content)
        .bind(new_post.post_type.as_str())
        .bind(image_url)
        .bind(image_id)
        .bind(&new_post.location_text)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_post(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("post {} missing after insert", id)))
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostView>> {
        let sql = format!("{} WHERE p.id = $1 AND p.is_active", POST_VIEW_SELECT);
        let row = sqlx::query_as::<_, PostViewRow>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(PostView::try_from).transpose()
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<(Vec<PostView>, i64)> {
        let post_type = filter.post_type.map(|t| t.as_str());
        let location = filter.location.as_deref().map(like_pattern);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM posts p {}", FEED_FILTER))
                .bind(post_type)
                .bind(location.as_deref())
                .bind(filter.author_id)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            "{} {} ORDER BY p.created_at DESC, p.seq DESC LIMIT $4 OFFSET $5",
            POST_VIEW_SELECT, FEED_FILTER
        );
        let rows = sqlx::query_as::<_, PostViewRow>(&sql)
            .bind(post_type)
            .bind(location.as_deref())
            .bind(filter.author_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let posts = rows
            .into_iter()
            .map(PostView::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((posts, total))
    }

    async fn toggle_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        action: ReactionKind,
    ) -> Result<Option<ReactionOutcome>> {
        let mut tx = self.pool.begin().await?;

        // Concurrent toggles on one post serialise on this row lock
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 AND is_active FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let held: Option<String> = sqlx::query_scalar(
            "DELETE FROM post_reactions WHERE post_id = $1 AND user_id = $2 RETURNING kind",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let previous = ReactionState::from_kind(held.as_deref().map(parse_kind).transpose()?);
        let current = previous.apply(action);
        let now = Utc::now();

        if let Some(kind) = current.kind() {
            sqlx::query(
                r#"
                INSERT INTO post_reactions (post_id, user_id, kind, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(post_id)
            .bind(user_id)
            .bind(kind.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE posts SET updated_at = $2 WHERE id = $1")
            .bind(post_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let (like_count, dislike_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE kind = 'like'),
                   COUNT(*) FILTER (WHERE kind = 'dislike')
            FROM post_reactions
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(ReactionOutcome {
            action,
            previous,
            current,
            like_count,
            dislike_count,
        }))
    }

    async fn viewer_reactions(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ReactionKind>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT post_id, kind FROM post_reactions WHERE user_id = $1 AND post_id = ANY($2)",
        )
        .bind(user_id)
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(post_id, kind)| Ok((post_id, parse_kind(&kind)?)))
            .collect()
    }

    async fn deactivate_post(&self, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts SET is_active = FALSE, updated_at = $2 WHERE id = $1 AND is_active",
        )
        .bind(post_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
