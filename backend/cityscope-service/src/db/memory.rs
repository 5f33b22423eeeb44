//! In-process store implementing every repository trait.
//!
//! All state sits behind one lock, so each trait call is a single atomic step:
//! a reaction toggle or a reply insert with its count bump can never be
//! observed half-applied.

use super::{PostRepository, ReplyRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{
    AuthorSummary, NewPost, NewReply, NewUser, PageRequest, Post, PostFilter, PostView,
    ProfileUpdate, ReactionKind, ReactionOutcome, ReactionState, Reply, ReplyView, User,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Insertion sequence breaks `created_at` ties
struct Sequenced<T> {
    seq: u64,
    value: T,
}

#[derive(Default)]
struct State {
    next_seq: u64,
    users: Vec<User>,
    posts: HashMap<Uuid, Sequenced<Post>>,
    /// post id -> user id -> held reaction
    reactions: HashMap<Uuid, HashMap<Uuid, ReactionKind>>,
    replies: Vec<Sequenced<Reply>>,
}

impl State {
    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn author(&self, user_id: Uuid) -> Option<AuthorSummary> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(AuthorSummary::from)
    }

    fn reaction_counts(&self, post_id: Uuid) -> (i64, i64) {
        self.reactions
            .get(&post_id)
            .map(|by_user| {
                by_user.values().fold((0, 0), |(likes, dislikes), kind| match kind {
                    ReactionKind::Like => (likes + 1, dislikes),
                    ReactionKind::Dislike => (likes, dislikes + 1),
                })
            })
            .unwrap_or((0, 0))
    }

    fn post_view(&self, post: &Post) -> Option<PostView> {
        let author = self.author(post.author_id)?;
        let (likes, dislikes) = self.reaction_counts(post.id);
        Some(PostView::from_parts(post.clone(), author, likes, dislikes))
    }

    fn reply_view(&self, reply: &Reply) -> Option<ReplyView> {
        let author = self.author(reply.author_id)?;
        // No operation writes reply likes yet
        Some(ReplyView::from_parts(reply.clone(), author, 0))
    }

    fn active_post_mut(&mut self, post_id: Uuid) -> Option<&mut Post> {
        self.posts
            .get_mut(&post_id)
            .map(|entry| &mut entry.value)
            .filter(|post| post.is_active)
    }
}

/// Thread-safe in-memory backend
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    /// Number of active replies referencing `post_id`
    pub fn active_reply_total(&self, post_id: Uuid) -> Result<i64> {
        let state = self.read()?;
        Ok(state
            .replies
            .iter()
            .filter(|r| r.value.post_id == post_id && r.value.is_active)
            .count() as i64)
    }

    /// Set a user's active flag; returns false when the user does not exist
    pub fn set_user_active(&self, user_id: Uuid, active: bool) -> Result<bool> {
        let mut state = self.write()?;
        match state.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl PostRepository for MemoryStore {
    async fn insert_post(&self, new_post: NewPost) -> Result<PostView> {
        let mut state = self.write()?;
        let author = state
            .author(new_post.author_id)
            .ok_or_else(|| AppError::Internal(format!("author {} missing", new_post.author_id)))?;

        let now = Utc::now();
        let (image_url, image_id) = match new_post.image {
            Some((url, id)) => (Some(url), Some(id)),
            None => (None, None),
        };
        let post = Post {
            id: Uuid::new_v4(),
            author_id: new_post.author_id,
            text_content: new_post.text_content,
            post_type: new_post.post_type,
            image_url,
            image_id,
            location_text: new_post.location_text,
            reply_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let seq = state.bump_seq();
        state.posts.insert(
            post.id,
            Sequenced {
                seq,
                value: post.clone(),
            },
        );
        Ok(PostView::from_parts(post, author, 0, 0))
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostView>> {
        let state = self.read()?;
        Ok(state
            .posts
            .get(&post_id)
            .filter(|entry| entry.value.is_active)
            .and_then(|entry| state.post_view(&entry.value)))
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<(Vec<PostView>, i64)> {
        let state = self.read()?;
        let mut matching: Vec<&Sequenced<Post>> = state
            .posts
            .values()
            .filter(|entry| filter.matches(&entry.value))
            .collect();
        matching.sort_by(|a, b| {
            b.value
                .created_at
                .cmp(&a.value.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        let total = matching.len() as i64;
        let items = matching[page.window(matching.len())]
            .iter()
            .filter_map(|entry| state.post_view(&entry.value))
            .collect();
        Ok((items, total))
    }

    async fn toggle_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        action: ReactionKind,
    ) -> Result<Option<ReactionOutcome>> {
        let mut state = self.write()?;
        match state.active_post_mut(post_id) {
            Some(post) => post.updated_at = Utc::now(),
            None => return Ok(None),
        }

        let by_user = state.reactions.entry(post_id).or_default();
        // Clear whatever the user holds before recording the next state
        let previous = ReactionState::from_kind(by_user.remove(&user_id));
        let current = previous.apply(action);
        if let Some(kind) = current.kind() {
            by_user.insert(user_id, kind);
        }

        let (like_count, dislike_count) = state.reaction_counts(post_id);
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
        let state = self.read()?;
        Ok(post_ids
            .iter()
            .filter_map(|post_id| {
                state
                    .reactions
                    .get(post_id)
                    .and_then(|by_user| by_user.get(&user_id))
                    .map(|kind| (*post_id, *kind))
            })
            .collect())
    }

    async fn deactivate_post(&self, post_id: Uuid) -> Result<bool> {
        let mut state = self.write()?;
        match state.active_post_mut(post_id) {
            Some(post) => {
                post.is_active = false;
                post.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl ReplyRepository for MemoryStore {
    async fn insert_reply(&self, new_reply: NewReply) -> Result<Option<ReplyView>> {
        let mut state = self.write()?;
        let author = state
            .author(new_reply.author_id)
            .ok_or_else(|| AppError::Internal(format!("author {} missing", new_reply.author_id)))?;

        let now = Utc::now();
        match state.active_post_mut(new_reply.post_id) {
            Some(post) => {
                post.reply_count += 1;
                post.updated_at = now;
            }
            None => return Ok(None),
        }

        let reply = Reply {
            id: Uuid::new_v4(),
            post_id: new_reply.post_id,
            author_id: new_reply.author_id,
            text_content: new_reply.text_content,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let seq = state.bump_seq();
        state.replies.push(Sequenced {
            seq,
            value: reply.clone(),
        });
        Ok(Some(ReplyView::from_parts(reply, author, 0)))
    }

    async fn list_replies(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> Result<(Vec<ReplyView>, i64)> {
        let state = self.read()?;
        let mut matching: Vec<&Sequenced<Reply>> = state
            .replies
            .iter()
            .filter(|entry| entry.value.post_id == post_id && entry.value.is_active)
            .collect();
        matching.sort_by(|a, b| {
            a.value
                .created_at
                .cmp(&b.value.created_at)
                .then(a.seq.cmp(&b.seq))
        });

        let total = matching.len() as i64;
        let items = matching[page.window(matching.len())]
            .iter()
            .filter_map(|entry| state.reply_view(&entry.value))
            .collect();
        Ok((items, total))
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<User> {
        let mut state = self.write()?;
        if state.users.iter().any(|u| u.username == new_user.username) {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }
        if state.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            display_name: new_user.display_name,
            bio: String::new(),
            location: new_user.location,
            profile_image_url: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let state = self.read()?;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.read()?;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_active_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .find(|u| u.username == username && u.is_active)
            .cloned())
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
        let mut state = self.write()?;
        let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        if let Some(bio) = update.bio {
            user.bio = bio;
        }
        if let Some(location) = update.location {
            user.location = location;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn search_active(&self, query: &str, limit: i64) -> Result<Vec<User>> {
        let state = self.read()?;
        let needle = query.to_lowercase();
        Ok(state
            .users
            .iter()
            .filter(|u| u.is_active && u.username.to_lowercase().contains(&needle))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostType;
    use std::sync::Arc;

    async fn seed_user(store: &MemoryStore, username: &str) -> User {
        store
            .insert_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: "hash".to_string(),
                display_name: username.to_string(),
                location: String::new(),
            })
            .await
            .unwrap()
    }

    async fn seed_post(store: &MemoryStore, author: Uuid, text: &str) -> PostView {
        store
            .insert_post(NewPost {
                author_id: author,
                text_content: text.to_string(),
                post_type: PostType::Recommend,
                location_text: String::new(),
                image: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reactions_stay_mutually_exclusive() {
        let store = MemoryStore::new();
        let author = seed_user(&store, "author").await;
        let voter = seed_user(&store, "voter").await;
        let post = seed_post(&store, author.id, "Great coffee shop on 5th").await;

        let liked = store
            .toggle_reaction(post.id, voter.id, ReactionKind::Like)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((liked.like_count, liked.dislike_count), (1, 0));

        let disliked = store
            .toggle_reaction(post.id, voter.id, ReactionKind::Dislike)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((disliked.like_count, disliked.dislike_count), (0, 1));
        assert_eq!(disliked.previous, ReactionState::Liked);
        assert_eq!(disliked.current, ReactionState::Disliked);

        let held = store.viewer_reactions(voter.id, &[post.id]).await.unwrap();
        assert_eq!(held.get(&post.id), Some(&ReactionKind::Dislike));
    }

    #[tokio::test]
    async fn test_inactive_post_rejects_interaction() {
        let store = MemoryStore::new();
        let author = seed_user(&store, "author").await;
        let post = seed_post(&store, author.id, "soon gone").await;

        assert!(store.deactivate_post(post.id).await.unwrap());
        assert!(!store.deactivate_post(post.id).await.unwrap());
        assert!(store.find_post(post.id).await.unwrap().is_none());
        assert!(store
            .toggle_reaction(post.id, author.id, ReactionKind::Like)
            .await
            .unwrap()
            .is_none());

        let reply = store
            .insert_reply(NewReply {
                post_id: post.id,
                author_id: author.id,
                text_content: "hello?".to_string(),
            })
            .await
            .unwrap();
        assert!(reply.is_none());
        assert_eq!(store.active_reply_total(post.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reply_count_tracks_replies() {
        let store = MemoryStore::new();
        let author = seed_user(&store, "author").await;
        let post = seed_post(&store, author.id, "question").await;

        for i in 0..3 {
            store
                .insert_reply(NewReply {
                    post_id: post.id,
                    author_id: author.id,
                    text_content: format!("reply {}", i),
                })
                .await
                .unwrap()
                .unwrap();
        }

        let post = store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(post.reply_count, 3);
        assert_eq!(store.active_reply_total(post.id).unwrap(), 3);

        let (replies, total) = store
            .list_replies(post.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 3);
        let texts: Vec<_> = replies.iter().map(|r| r.text_content.as_str()).collect();
        assert_eq!(texts, vec!["reply 0", "reply 1", "reply 2"]);
    }

    #[tokio::test]
    async fn test_feed_newest_first_with_tie_break() {
        let store = MemoryStore::new();
        let author = seed_user(&store, "author").await;
        for text in ["first", "second", "third"] {
            seed_post(&store, author.id, text).await;
        }

        let (posts, total) = store
            .list_posts(&PostFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 3);
        let texts: Vec<_> = posts.iter().map(|p| p.text_content.as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_duplicate_users_conflict() {
        let store = MemoryStore::new();
        seed_user(&store, "taken").await;
        let err = store
            .insert_user(NewUser {
                username: "taken".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
                display_name: "x".to_string(),
                location: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_search_skips_inactive_users() {
        let store = MemoryStore::new();
        seed_user(&store, "river_walker").await;
        let hidden = seed_user(&store, "RiverSide").await;
        store.set_user_active(hidden.id, false).unwrap();

        let found = store.search_active("RIVER", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "river_walker");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_toggles_keep_reactions_exclusive() {
        let store = Arc::new(MemoryStore::new());
        let author = seed_user(&store, "author").await;
        let voter = seed_user(&store, "voter").await;
        let post = seed_post(&store, author.id, "Busy thread").await;
        let (post_id, voter_id) = (post.id, voter.id);

        let mut handles = Vec::new();
        for i in 0..400 {
            let store = store.clone();
            let action = if i % 3 == 0 {
                ReactionKind::Dislike
            } else {
                ReactionKind::Like
            };
            handles.push(tokio::spawn(async move {
                store
                    .toggle_reaction(post_id, voter_id, action)
                    .await
                    .unwrap()
                    .unwrap()
            }));
        }

        for handle in handles {
            let outcome = handle.await.unwrap();
            assert!(outcome.like_count + outcome.dislike_count <= 1);
            assert!(outcome.like_count >= 0 && outcome.dislike_count >= 0);
        }

        let view = store.find_post(post.id).await.unwrap().unwrap();
        let held = store.viewer_reactions(voter.id, &[post.id]).await.unwrap();
        match held.get(&post.id) {
            Some(ReactionKind::Like) => assert_eq!((view.like_count, view.dislike_count), (1, 0)),
            Some(ReactionKind::Dislike) => {
                assert_eq!((view.like_count, view.dislike_count), (0, 1))
            }
            None => assert_eq!((view.like_count, view.dislike_count), (0, 0)),
        }
    }
}
