/// Post service - creation, reads, feed pagination and reaction toggles
use crate::db::PostRepository;
use crate::error::{AppError, FieldError, Result};
use crate::metrics::activity::{IMAGE_UPLOADS_TOTAL, POSTS_CREATED_TOTAL, REACTION_TOGGLES_TOTAL};
use crate::models::{
    NewPost, Page, PageRequest, PostFilter, PostType, PostView, ReactionKind, ReactionOutcome,
    ReactionState,
};
use crate::storage::BlobStore;
use crate::validation::{field_errors, trim_in_place};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_post_text(text: &str) -> std::result::Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::new("required").with_message("Post content is required".into()));
    }
    if text.chars().count() > 280 {
        return Err(ValidationError::new("length")
            .with_message("Post content cannot exceed 280 characters".into()));
    }
    Ok(())
}

fn validate_post_type(raw: &str) -> std::result::Result<(), ValidationError> {
    raw.parse::<PostType>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("post_type").with_message("Invalid post type".into()))
}

/// Fields of a new post as submitted (JSON body or multipart text fields)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[serde(default)]
    #[validate(custom(function = "validate_post_text"))]
    pub text_content: String,
    #[serde(default)]
    #[validate(custom(function = "validate_post_type"))]
    pub post_type: String,
    #[validate(length(max = 100, message = "Location cannot exceed 100 characters"))]
    pub location_text: Option<String>,
}

impl CreatePostInput {
    fn normalize(&mut self) {
        trim_in_place(&mut self.text_content);
        trim_in_place(&mut self.post_type);
        if let Some(location) = self.location_text.as_mut() {
            trim_in_place(location);
        }
    }
}

/// Image bytes received with a post
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Raw feed filters from the query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub post_type: Option<String>,
    pub location: Option<String>,
}

impl FeedQuery {
    /// Empty values mean "no filter"; an unknown post type is a validation error
    pub fn into_filter(self) -> Result<PostFilter> {
        let post_type = match self.post_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<PostType>()
                    .map_err(|_| AppError::invalid_field("postType", "Invalid post type"))?,
            ),
        };
        let location = self
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        Ok(PostFilter {
            post_type,
            location,
            author_id: None,
        })
    }
}

/// Image size limit as whole megabytes for messages
fn megabytes(bytes: usize) -> usize {
    (bytes + (1 << 20) - 1) >> 20
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    blobs: Arc<dyn BlobStore>,
    max_image_bytes: usize,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        blobs: Arc<dyn BlobStore>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            posts,
            blobs,
            max_image_bytes,
        }
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Field error for an image over the size limit
    pub fn oversized_image_error(&self) -> FieldError {
        FieldError::new(
            "image",
            format!("Image cannot exceed {}MB", megabytes(self.max_image_bytes)),
        )
    }

    fn image_errors(&self, image: &ImageUpload) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let is_image = image
            .content_type
            .parse::<mime::Mime>()
            .map(|m| m.type_() == mime::IMAGE)
            .unwrap_or(false);
        if !is_image {
            errors.push(FieldError::new("image", "Only image files are allowed"));
        }
        if image.bytes.len() > self.max_image_bytes {
            errors.push(self.oversized_image_error());
        }
        if image.bytes.is_empty() {
            errors.push(FieldError::new("image", "Image file is empty"));
        }
        errors
    }

    /// Validate, store the image if any, then persist the post.
    /// Nothing is written unless every step before the insert succeeds.
    pub async fn create_post(
        &self,
        author_id: Uuid,
        mut input: CreatePostInput,
        image: Option<ImageUpload>,
    ) -> Result<PostView> {
        input.normalize();

        let mut errors = match input.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };
        if let Some(image) = &image {
            errors.extend(self.image_errors(image));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let post_type = input
            .post_type
            .parse::<PostType>()
            .map_err(|_| AppError::invalid_field("postType", "Invalid post type"))?;

        let stored = match image {
            Some(image) => match self.blobs.store(image.bytes, &image.content_type).await {
                Ok(blob) => {
                    IMAGE_UPLOADS_TOTAL.with_label_values(&["success"]).inc();
                    Some((blob.url, blob.id))
                }
                Err(e) => {
                    IMAGE_UPLOADS_TOTAL.with_label_values(&["error"]).inc();
                    return Err(e.into());
                }
            },
            None => None,
        };
        let with_image = stored.is_some();

        let post = self
            .posts
            .insert_post(NewPost {
                author_id,
                text_content: input.text_content,
                post_type,
                location_text: input.location_text.unwrap_or_default(),
                image: stored,
            })
            .await
            .map_err(|e| {
                if with_image {
                    warn!(author_id = %author_id, "post insert failed after image upload; blob left orphaned");
                }
                e
            })?;

        POSTS_CREATED_TOTAL
            .with_label_values(&[if with_image { "true" } else { "false" }])
            .inc();
        info!(post_id = %post.id, author_id = %author_id, post_type = %post.post_type, "post created");

        Ok(post.with_viewer_state(ReactionState::Neutral))
    }

    /// Attach the viewer's reaction flags when the request is authenticated
    async fn decorate(&self, posts: Vec<PostView>, viewer: Option<Uuid>) -> Result<Vec<PostView>> {
        let Some(viewer) = viewer else {
            return Ok(posts);
        };
        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let held = self.posts.viewer_reactions(viewer, &ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let state = ReactionState::from_kind(held.get(&post.id).copied());
                post.with_viewer_state(state)
            })
            .collect())
    }

    pub async fn get_post(&self, post_id: Uuid, viewer: Option<Uuid>) -> Result<PostView> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let mut decorated = self.decorate(vec![post], viewer).await?;
        decorated
            .pop()
            .ok_or_else(|| AppError::Internal("decorated post vanished".to_string()))
    }

    pub async fn list_posts(
        &self,
        filter: PostFilter,
        page: PageRequest,
        viewer: Option<Uuid>,
    ) -> Result<Page<PostView>> {
        let (posts, total) = self.posts.list_posts(&filter, page).await?;
        let posts = self.decorate(posts, viewer).await?;
        Ok(Page::new(posts, page, total))
    }

    pub async fn list_feed(
        &self,
        query: FeedQuery,
        page: PageRequest,
        viewer: Option<Uuid>,
    ) -> Result<Page<PostView>> {
        let filter = query.into_filter()?;
        self.list_posts(filter, page, viewer).await
    }

    pub async fn list_author_posts(
        &self,
        author_id: Uuid,
        page: PageRequest,
        viewer: Option<Uuid>,
    ) -> Result<Page<PostView>> {
        let filter = PostFilter {
            author_id: Some(author_id),
            ..PostFilter::default()
        };
        self.list_posts(filter, page, viewer).await
    }

    pub async fn toggle_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        action: ReactionKind,
    ) -> Result<ReactionOutcome> {
        let outcome = self
            .posts
            .toggle_reaction(post_id, user_id, action)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        REACTION_TOGGLES_TOTAL
            .with_label_values(&[action.as_str(), outcome.outcome_label()])
            .inc();
        info!(
            post_id = %post_id,
            user_id = %user_id,
            action = action.as_str(),
            outcome = outcome.outcome_label(),
            "reaction toggled"
        );

        Ok(outcome)
    }

    /// Soft-delete a post; it disappears from every read
    pub async fn deactivate_post(&self, post_id: Uuid) -> Result<()> {
        if self.posts.deactivate_post(post_id).await? {
            info!(post_id = %post_id, "post deactivated");
            Ok(())
        } else {
            Err(AppError::NotFound("Post not found".to_string()))
        }
    }
}
