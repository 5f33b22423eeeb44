/// Database access layer
///
/// Repository traits describe what the services need from persistence. Two
/// implementations exist: PostgreSQL (`Pg*Repository`) and [`MemoryStore`],
/// which backs tests and `STORE_BACKEND=memory`.
pub mod memory;
pub mod post_repo;
pub mod reply_repo;
pub mod user_repo;

pub use memory::MemoryStore;
pub use post_repo::PgPostRepository;
pub use reply_repo::PgReplyRepository;
pub use user_repo::PgUserRepository;

use crate::error::Result;
use crate::models::{
    NewPost, NewReply, NewUser, PageRequest, PostFilter, PostView, ProfileUpdate, ReactionKind,
    ReactionOutcome, ReplyView, User,
};
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    /// Persist a new active post and return it with its author resolved
    async fn insert_post(&self, post: NewPost) -> Result<PostView>;

    /// Active post by id
    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostView>>;

    /// Active posts matching `filter`, newest first
    /// Returns: (page items, total matching)
    async fn list_posts(&self, filter: &PostFilter, page: PageRequest)
        -> Result<(Vec<PostView>, i64)>;

    /// Apply a like/dislike toggle for `user_id` as one atomic step.
    /// Returns `None` when the post is missing or inactive.
    async fn toggle_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        action: ReactionKind,
    ) -> Result<Option<ReactionOutcome>>;

    /// Reactions `user_id` holds on any of `post_ids`
    async fn viewer_reactions(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ReactionKind>>;

    /// Soft-delete; returns false when the post was already inactive or missing
    async fn deactivate_post(&self, post_id: Uuid) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait ReplyRepository: Send + Sync {
    /// Insert a reply and increment the parent's reply count as one unit.
    /// Returns `None` (and writes nothing) when the parent is missing or inactive.
    async fn insert_reply(&self, reply: NewReply) -> Result<Option<ReplyView>>;

    /// Active replies of a post, oldest first
    /// Returns: (page items, total matching)
    async fn list_replies(&self, post_id: Uuid, page: PageRequest)
        -> Result<(Vec<ReplyView>, i64)>;
}

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    /// Any user by id, active or not
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Any user by (lower-cased) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_active_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Apply the supplied fields; `None` when the user does not exist
    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Option<User>>;

    /// Active users whose username contains `query`, case-insensitively
    async fn search_active(&self, query: &str, limit: i64) -> Result<Vec<User>>;
}

/// Escape `%`, `_` and `\` so user text matches literally inside ILIKE
pub(crate) fn like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
