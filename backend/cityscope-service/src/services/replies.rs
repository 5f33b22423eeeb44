/// Reply service - reply creation and listing
use crate::db::ReplyRepository;
use crate::error::{AppError, Result};
use crate::metrics::activity::REPLIES_CREATED_TOTAL;
use crate::models::{NewReply, Page, PageRequest, ReplyView};
use crate::validation::trim_in_place;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_reply_text(text: &str) -> std::result::Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::new("required").with_message("Reply content is required".into()));
    }
    if text.chars().count() > 280 {
        return Err(ValidationError::new("length")
            .with_message("Reply content cannot exceed 280 characters".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyInput {
    #[serde(default)]
    #[validate(custom(function = "validate_reply_text"))]
    pub text_content: String,
}

#[derive(Clone)]
pub struct ReplyService {
    replies: Arc<dyn ReplyRepository>,
}

impl ReplyService {
    pub fn new(replies: Arc<dyn ReplyRepository>) -> Self {
        Self { replies }
    }

    /// Create a reply; the parent's reply count moves with it or not at all
    pub async fn create_reply(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        mut input: CreateReplyInput,
    ) -> Result<ReplyView> {
        trim_in_place(&mut input.text_content);
        input.validate()?;

        let reply = self
            .replies
            .insert_reply(NewReply {
                post_id,
                author_id,
                text_content: input.text_content,
            })
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        REPLIES_CREATED_TOTAL.inc();
        info!(reply_id = %reply.id, post_id = %post_id, author_id = %author_id, "reply created");
        Ok(reply)
    }

    /// Replies of a post, oldest first; an unknown post simply has none
    pub async fn list_replies(&self, post_id: Uuid, page: PageRequest) -> Result<Page<ReplyView>> {
        let (replies, total) = self.replies.list_replies(post_id, page).await?;
        Ok(Page::new(replies, page, total))
    }
}
