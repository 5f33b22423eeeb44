/// Business logic layer
///
/// Services validate input, call the repositories and blob store, and record
/// metrics. They are cheap to clone and shared through [`AppState`].
pub mod auth;
pub mod posts;
pub mod replies;
pub mod users;

pub use auth::{AuthRejection, AuthService, AuthSession, LoginInput, RegisterInput};
pub use posts::{CreatePostInput, FeedQuery, ImageUpload, PostService};
pub use replies::{CreateReplyInput, ReplyService};
pub use users::{UpdateProfileInput, UserService};

use crate::db::{
    MemoryStore, PgPostRepository, PgReplyRepository, PgUserRepository, PostRepository,
    ReplyRepository, UserRepository,
};
use crate::storage::BlobStore;
use crypto_core::JwtKeys;
use sqlx::PgPool;
use std::sync::Arc;

/// Repository handles for one persistence backend
#[derive(Clone)]
pub struct Stores {
    pub posts: Arc<dyn PostRepository>,
    pub replies: Arc<dyn ReplyRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            replies: Arc::new(PgReplyRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            posts: store.clone(),
            replies: store.clone(),
            users: store,
        }
    }
}

/// Everything handlers need, registered once as `web::Data<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub posts: PostService,
    pub replies: ReplyService,
    pub users: UserService,
}

impl AppState {
    pub fn new(
        stores: Stores,
        blobs: Arc<dyn BlobStore>,
        keys: JwtKeys,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            auth: AuthService::new(stores.users.clone(), keys),
            posts: PostService::new(stores.posts, blobs, max_image_bytes),
            replies: ReplyService::new(stores.replies),
            users: UserService::new(stores.users),
        }
    }
}
