/// Data models for CityScope Service
pub mod pagination;
pub mod post;
pub mod reply;
pub mod user;

pub use pagination::{Page, PageRequest, Pagination, PaginationQuery};
pub use post::{
    NewPost, Post, PostFilter, PostType, PostView, ReactionKind, ReactionOutcome, ReactionState,
    ReactionSummary,
};
pub use reply::{NewReply, Reply, ReplyView};
pub use user::{AuthorSummary, CurrentUser, NewUser, ProfileUpdate, User, UserProfile};
