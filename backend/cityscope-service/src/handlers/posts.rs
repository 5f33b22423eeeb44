/// Post handlers - HTTP endpoints for posts, reactions and replies
use super::{created, ok, ok_with_message, PostList, ReplyList};
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::{PageRequest, PaginationQuery, ReactionKind};
use crate::services::{AppState, CreatePostInput, CreateReplyInput, FeedQuery, ImageUpload};
use actix_multipart::Multipart;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use futures_util::stream::StreamExt;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

/// Upper bound for a JSON post body and for each multipart text field
const MAX_TEXT_BODY_BYTES: usize = 64 * 1024;

/// Query parameters of the feed
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub post_type: Option<String>,
    pub location: Option<String>,
}

async fn read_json_input(mut payload: web::Payload) -> Result<CreatePostInput> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|e| AppError::BadRequest(format!("Failed to read request body: {}", e)))?;
        if body.len() + chunk.len() > MAX_TEXT_BODY_BYTES {
            return Err(AppError::BadRequest("Request body too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }

    if body.is_empty() {
        return Ok(CreatePostInput::default());
    }
    Ok(serde_json::from_slice(&body)?)
}

fn utf8_field(name: &str, data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec())
        .map_err(|_| AppError::invalid_field(name, "Field must be valid UTF-8"))
}

/// Collect the post fields and optional `image` part of a multipart form
async fn read_multipart_input(
    state: &AppState,
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<(CreatePostInput, Option<ImageUpload>)> {
    let max_image_bytes = state.posts.max_image_bytes();
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut input = CreatePostInput::default();
    let mut image = None;

    while let Some(item) = multipart.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|m| m.to_string());
        let limit = if name == "image" {
            max_image_bytes
        } else {
            MAX_TEXT_BODY_BYTES
        };

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::BadRequest(format!("Error reading field {}: {}", name, e)))?;
            if data.len() + chunk.len() > limit {
                return Err(if name == "image" {
                    AppError::Validation(vec![state.posts.oversized_image_error()])
                } else {
                    AppError::invalid_field(&name, "Field is too large")
                });
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "textContent" => input.text_content = utf8_field(&name, &data)?,
            "postType" => input.post_type = utf8_field(&name, &data)?,
            "locationText" => input.location_text = Some(utf8_field(&name, &data)?),
            // Browsers send an empty part when no file was chosen
            "image" if !data.is_empty() => {
                image = Some(ImageUpload {
                    bytes: data,
                    content_type: content_type
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                });
            }
            other => debug!(field = other, "ignoring multipart field"),
        }
    }

    Ok((input, image))
}

/// Media types compare case-insensitively, parameters aside
fn is_multipart_form(req: &HttpRequest) -> bool {
    matches!(
        req.mime_type(),
        Ok(Some(m)) if m.essence_str().eq_ignore_ascii_case(mime::MULTIPART_FORM_DATA.essence_str())
    )
}

/// Create a new post (JSON body, or multipart with an optional image)
pub async fn create_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let (input, image) = if is_multipart_form(&req) {
        read_multipart_input(&state, &req, payload).await?
    } else {
        (read_json_input(payload).await?, None)
    };

    let post = state.posts.create_post(user.id, input, image).await?;
    Ok(created("Post created successfully", post))
}

/// Paginated feed, newest first
pub async fn list_posts(
    state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    params: web::Query<FeedParams>,
) -> Result<HttpResponse> {
    let params = params.into_inner();
    let page = PageRequest::new(params.page.as_deref(), params.limit.as_deref());
    let query = FeedQuery {
        post_type: params.post_type,
        location: params.location,
    };

    let result = state
        .posts
        .list_feed(query, page, viewer.map(|v| v.id))
        .await?;
    Ok(ok(PostList {
        posts: result.items,
        pagination: result.pagination,
    }))
}

/// Get a post by ID
pub async fn get_post(
    state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = state
        .posts
        .get_post(post_id.into_inner(), viewer.map(|v| v.id))
        .await?;
    Ok(ok(post))
}

async fn react(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: Uuid,
    action: ReactionKind,
) -> Result<HttpResponse> {
    let outcome = state.posts.toggle_reaction(post_id, user.id, action).await?;
    Ok(ok_with_message(outcome.message(), outcome.summary()))
}

/// Toggle the caller's like
pub async fn like_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    react(state, user, post_id.into_inner(), ReactionKind::Like).await
}

/// Toggle the caller's dislike
pub async fn dislike_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    react(state, user, post_id.into_inner(), ReactionKind::Dislike).await
}

pub async fn create_reply(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: web::Path<Uuid>,
    body: web::Json<CreateReplyInput>,
) -> Result<HttpResponse> {
    let reply = state
        .replies
        .create_reply(post_id.into_inner(), user.id, body.into_inner())
        .await?;
    Ok(created("Reply created successfully", reply))
}

/// Replies of a post, oldest first
pub async fn list_replies(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    query: web::Query<PaginationQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::from_query(&query);
    let result = state
        .replies
        .list_replies(post_id.into_inner(), page)
        .await?;
    Ok(ok(ReplyList {
        replies: result.items,
        pagination: result.pagination,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_multipart_detection_ignores_case_and_params() {
        for content_type in [
            "multipart/form-data; boundary=abc",
            "Multipart/Form-Data; boundary=abc",
            "MULTIPART/FORM-DATA",
        ] {
            let req = TestRequest::default()
                .insert_header(("Content-Type", content_type))
                .to_http_request();
            assert!(is_multipart_form(&req), "{content_type}");
        }

        let json = TestRequest::default()
            .insert_header(("Content-Type", "application/json"))
            .to_http_request();
        assert!(!is_multipart_form(&json));
        assert!(!is_multipart_form(&TestRequest::default().to_http_request()));
    }
}
