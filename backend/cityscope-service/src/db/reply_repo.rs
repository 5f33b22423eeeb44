use super::ReplyRepository;
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, NewReply, PageRequest, Reply, ReplyView};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct ReplyViewRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    text_content: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_username: String,
    author_display_name: String,
    author_profile_image_url: String,
    like_count: i64,
}

impl From<ReplyViewRow> for ReplyView {
    fn from(row: ReplyViewRow) -> Self {
        let author = AuthorSummary {
            id: row.author_id,
            username: row.author_username,
            display_name: row.author_display_name,
            profile_image_url: row.author_profile_image_url,
        };
        let reply = Reply {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            text_content: row.text_content,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        ReplyView::from_parts(reply, author, row.like_count)
    }
}

pub struct PgReplyRepository {
    pool: PgPool,
}

impl PgReplyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReplyRepository for PgReplyRepository {
    async fn insert_reply(&self, new_reply: NewReply) -> Result<Option<ReplyView>> {
        let mut tx = self.pool.begin().await?;

        let parent: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 AND is_active FOR UPDATE")
                .bind(new_reply.post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if parent.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let now = Utc::now();
        let reply = Reply {
            id: Uuid::new_v4(),
            post_id: new_reply.post_id,
            author_id: new_reply.author_id,
            text_content: new_reply.text_content,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO replies (id, post_id, author_id, text_content, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $5)
            "#,
        )
        .bind(reply.id)
        .bind(reply.post_id)
        .bind(reply.author_id)
        .bind(&reply.text_content)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let bumped = sqlx::query(
            "UPDATE posts SET reply_count = reply_count + 1, updated_at = $2 WHERE id = $1",
        )
        .bind(reply.post_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() != 1 {
            // Dropping the transaction rolls the reply back as well
            return Err(AppError::Internal(format!(
                "reply count of post {} not incremented",
                reply.post_id
            )));
        }

        let author = sqlx::query_as::<_, AuthorSummary>(
            "SELECT id, username, display_name, profile_image_url FROM users WHERE id = $1",
        )
        .bind(reply.author_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(ReplyView::from_parts(reply, author, 0)))
    }

    async fn list_replies(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> Result<(Vec<ReplyView>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM replies WHERE post_id = $1 AND is_active")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, ReplyViewRow>(
            r#"
            SELECT r.id, r.post_id, r.author_id, r.text_content, r.is_active,
                   r.created_at, r.updated_at,
                   u.username AS author_username,
                   u.display_name AS author_display_name,
                   u.profile_image_url AS author_profile_image_url,
                   (SELECT COUNT(*) FROM reply_likes l WHERE l.reply_id = r.id) AS like_count
            FROM replies r
            JOIN users u ON u.id = r.author_id
            WHERE r.post_id = $1 AND r.is_active
            ORDER BY r.created_at ASC, r.seq ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(ReplyView::from).collect(), total))
    }
}
