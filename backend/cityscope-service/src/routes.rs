//! Route table shared by the binary and the HTTP tests.

use crate::error::{json_error_handler, query_error_handler, AppError};
use crate::handlers::{self, auth, health, posts, users};
use crate::metrics::serve_metrics;
use actix_web::web;

const MAX_JSON_BYTES: usize = 64 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_JSON_BYTES)
            .error_handler(json_error_handler),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .app_data(
        web::PathConfig::default()
            .error_handler(|_, _| AppError::NotFound("Resource not found".to_string()).into()),
    )
    .route("/", web::get().to(health::index))
    .route("/health", web::get().to(health::liveness))
    .route("/health/ready", web::get().to(health::readiness))
    .route("/metrics", web::get().to(serve_metrics))
    .service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::post().to(posts::create_post))
                    .route("", web::get().to(posts::list_posts))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}/like", web::post().to(posts::like_post))
                    .route("/{id}/dislike", web::post().to(posts::dislike_post))
                    .route("/{id}/replies", web::post().to(posts::create_reply))
                    .route("/{id}/replies", web::get().to(posts::list_replies)),
            )
            .service(
                // Literal segments first so they are not taken as usernames
                web::scope("/users")
                    .route("/search", web::get().to(users::search_users))
                    .route("/profile", web::put().to(users::update_profile))
                    .route("/{username}", web::get().to(users::get_profile))
                    .route("/{username}/posts", web::get().to(users::get_user_posts)),
            ),
    )
    .default_service(web::to(handlers::not_found));
}
