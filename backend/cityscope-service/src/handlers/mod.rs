/// HTTP request handlers for cityscope-service
///
/// Every success body is `{ "success": true, "message"?: ..., "data": ... }`.
pub mod auth;
pub mod health;
pub mod posts;
pub mod users;

use crate::models::Pagination;
use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: T,
}

fn respond<T: Serialize>(status: StatusCode, message: Option<&'static str>, data: T) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse {
        success: true,
        message,
        data,
    })
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::OK, None, data)
}

pub fn ok_with_message<T: Serialize>(message: &'static str, data: T) -> HttpResponse {
    respond(StatusCode::OK, Some(message), data)
}

pub fn created<T: Serialize>(message: &'static str, data: T) -> HttpResponse {
    respond(StatusCode::CREATED, Some(message), data)
}

#[derive(Debug, Serialize)]
pub struct PostList<T: Serialize> {
    pub posts: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ReplyList<T: Serialize> {
    pub replies: Vec<T>,
    pub pagination: Pagination,
}

/// Fallback for unknown routes
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "success": false,
        "message": "API endpoint not found",
    }))
}
