/// User handlers - profiles, author feeds and search
use super::{ok, ok_with_message, PostList};
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::{PageRequest, PaginationQuery};
use crate::services::{AppState, UpdateProfileInput};
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Public profile of an active user
pub async fn get_profile(
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = state.users.get_profile(&username).await?;
    Ok(ok(profile))
}

/// Posts by one author, newest first
pub async fn get_user_posts(
    state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    username: web::Path<String>,
    query: web::Query<PaginationQuery>,
) -> Result<HttpResponse> {
    let author = state.users.find_active(&username).await?;
    let page = PageRequest::from_query(&query);
    let result = state
        .posts
        .list_author_posts(author.id, page, viewer.map(|v| v.id))
        .await?;

    Ok(ok(PostList {
        posts: result.items,
        pagination: result.pagination,
    }))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<UpdateProfileInput>,
) -> Result<HttpResponse> {
    let updated = state
        .users
        .update_profile(user.id, body.into_inner())
        .await?;
    Ok(ok_with_message("Profile updated successfully", updated))
}

pub async fn search_users(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let users = state.users.search(query.q.as_deref()).await?;
    Ok(ok(users))
}
