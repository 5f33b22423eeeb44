use super::user::AuthorSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Category of a community post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Recommend,
    Help,
    Update,
    Event,
}

impl PostType {
    pub const ALL: [PostType; 4] = [
        PostType::Recommend,
        PostType::Help,
        PostType::Update,
        PostType::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Recommend => "recommend",
            PostType::Help => "help",
            PostType::Update => "update",
            PostType::Event => "event",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid post type '{}'", s))
    }
}

/// A stored reaction, also used as the toggle action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            other => Err(format!("Unknown reaction kind '{}'", other)),
        }
    }
}

/// Reaction held by one user on one post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReactionState {
    #[default]
    Neutral,
    Liked,
    Disliked,
}

impl ReactionState {
    pub fn from_kind(kind: Option<ReactionKind>) -> Self {
        match kind {
            None => ReactionState::Neutral,
            Some(ReactionKind::Like) => ReactionState::Liked,
            Some(ReactionKind::Dislike) => ReactionState::Disliked,
        }
    }

    pub fn kind(self) -> Option<ReactionKind> {
        match self {
            ReactionState::Neutral => None,
            ReactionState::Liked => Some(ReactionKind::Like),
            ReactionState::Disliked => Some(ReactionKind::Dislike),
        }
    }

    /// Next state after `action`: repeating the held reaction clears it,
    /// anything else replaces whatever was held.
    pub fn apply(self, action: ReactionKind) -> Self {
        match (self, action) {
            (ReactionState::Liked, ReactionKind::Like)
            | (ReactionState::Disliked, ReactionKind::Dislike) => ReactionState::Neutral,
            (_, ReactionKind::Like) => ReactionState::Liked,
            (_, ReactionKind::Dislike) => ReactionState::Disliked,
        }
    }

    pub fn is_liked(self) -> bool {
        self == ReactionState::Liked
    }

    pub fn is_disliked(self) -> bool {
        self == ReactionState::Disliked
    }
}

/// Counts and caller state returned by a like/dislike call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub like_count: i64,
    pub dislike_count: i64,
    pub is_liked: bool,
    pub is_disliked: bool,
}

/// Result of applying a reaction toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionOutcome {
    pub action: ReactionKind,
    pub previous: ReactionState,
    pub current: ReactionState,
    pub like_count: i64,
    pub dislike_count: i64,
}

impl ReactionOutcome {
    pub fn summary(&self) -> ReactionSummary {
        ReactionSummary {
            like_count: self.like_count,
            dislike_count: self.dislike_count,
            is_liked: self.current.is_liked(),
            is_disliked: self.current.is_disliked(),
        }
    }

    pub fn message(&self) -> &'static str {
        match (self.action, self.current) {
            (ReactionKind::Like, ReactionState::Liked) => "Post liked",
            (ReactionKind::Like, _) => "Post unliked",
            (ReactionKind::Dislike, ReactionState::Disliked) => "Post disliked",
            (ReactionKind::Dislike, _) => "Post undisliked",
        }
    }

    /// Label for the toggle metric
    pub fn outcome_label(&self) -> &'static str {
        match (self.previous, self.current) {
            (_, ReactionState::Neutral) => "cleared",
            (ReactionState::Neutral, _) => "added",
            _ => "switched",
        }
    }
}

/// Post row as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text_content: String,
    pub post_type: PostType,
    pub image_url: Option<String>,
    pub image_id: Option<String>,
    pub location_text: String,
    pub reply_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text_content: String,
    pub post_type: PostType,
    pub location_text: String,
    /// `(url, id)` from the blob store, always set together
    pub image: Option<(String, String)>,
}

/// Feed and author-feed filters
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub post_type: Option<PostType>,
    /// Case-insensitive literal substring of `location_text`
    pub location: Option<String>,
    pub author_id: Option<Uuid>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        if !post.is_active {
            return false;
        }
        if self.post_type.is_some_and(|t| t != post.post_type) {
            return false;
        }
        if self.author_id.is_some_and(|a| a != post.author_id) {
            return false;
        }
        match &self.location {
            Some(needle) => post
                .location_text
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Post as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub author: AuthorSummary,
    pub text_content: String,
    pub post_type: PostType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub location_text: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub reply_count: i64,
    /// Caller's reaction; only present for authenticated reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disliked: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostView {
    pub fn from_parts(post: Post, author: AuthorSummary, like_count: i64, dislike_count: i64) -> Self {
        Self {
            id: post.id,
            author,
            text_content: post.text_content,
            post_type: post.post_type,
            image_url: post.image_url,
            image_id: post.image_id,
            location_text: post.location_text,
            like_count,
            dislike_count,
            reply_count: post.reply_count,
            is_liked: None,
            is_disliked: None,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }

    pub fn with_viewer_state(mut self, state: ReactionState) -> Self {
        self.is_liked = Some(state.is_liked());
        self.is_disliked = Some(state.is_disliked());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_transitions() {
        assert_eq!(ReactionState::Neutral.apply(ReactionKind::Like), ReactionState::Liked);
        assert_eq!(ReactionState::Liked.apply(ReactionKind::Like), ReactionState::Neutral);
        assert_eq!(ReactionState::Disliked.apply(ReactionKind::Like), ReactionState::Liked);
    }

    #[test]
    fn test_dislike_transitions() {
        assert_eq!(
            ReactionState::Neutral.apply(ReactionKind::Dislike),
            ReactionState::Disliked
        );
        assert_eq!(
            ReactionState::Disliked.apply(ReactionKind::Dislike),
            ReactionState::Neutral
        );
        assert_eq!(
            ReactionState::Liked.apply(ReactionKind::Dislike),
            ReactionState::Disliked
        );
    }

    #[test]
    fn test_double_toggle_returns_to_neutral() {
        for action in [ReactionKind::Like, ReactionKind::Dislike] {
            let state = ReactionState::Neutral.apply(action).apply(action);
            assert_eq!(state, ReactionState::Neutral);
        }
    }

    #[test]
    fn test_kind_round_trip() {
        for state in [
            ReactionState::Neutral,
            ReactionState::Liked,
            ReactionState::Disliked,
        ] {
            assert_eq!(ReactionState::from_kind(state.kind()), state);
        }
    }

    #[test]
    fn test_messages() {
        let outcome = |action, previous, current| ReactionOutcome {
            action,
            previous,
            current,
            like_count: 0,
            dislike_count: 0,
        };
        use ReactionKind::*;
        use ReactionState::*;
        assert_eq!(outcome(Like, Neutral, Liked).message(), "Post liked");
        assert_eq!(outcome(Like, Liked, Neutral).message(), "Post unliked");
        assert_eq!(outcome(Dislike, Liked, Disliked).message(), "Post disliked");
        assert_eq!(outcome(Dislike, Disliked, Neutral).message(), "Post undisliked");
        assert_eq!(outcome(Dislike, Liked, Disliked).outcome_label(), "switched");
    }

    #[test]
    fn test_post_type_parsing() {
        assert_eq!("event".parse::<PostType>().unwrap(), PostType::Event);
        assert!("bogus".parse::<PostType>().is_err());
        assert!("Event".parse::<PostType>().is_err());
    }

    #[test]
    fn test_filter_matches_location_case_insensitively() {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            text_content: "Farmers market".into(),
            post_type: PostType::Event,
            image_url: None,
            image_id: None,
            location_text: "Downtown Plaza".into(),
            reply_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let filter = PostFilter {
            location: Some("town p".into()),
            ..Default::default()
        };
        assert!(filter.matches(&post));

        let wrong_type = PostFilter {
            post_type: Some(PostType::Help),
            ..Default::default()
        };
        assert!(!wrong_type.matches(&post));

        let inactive = Post {
            is_active: false,
            ..post
        };
        assert!(!PostFilter::default().matches(&inactive));
    }
}
