use super::user::AuthorSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Reply row as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text_content: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReply {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text_content: String,
}

/// Reply as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: AuthorSummary,
    pub text_content: String,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReplyView {
    pub fn from_parts(reply: Reply, author: AuthorSummary, like_count: i64) -> Self {
        Self {
            id: reply.id,
            post_id: reply.post_id,
            author,
            text_content: reply.text_content,
            like_count,
            created_at: reply.created_at,
            updated_at: reply.updated_at,
        }
    }
}
