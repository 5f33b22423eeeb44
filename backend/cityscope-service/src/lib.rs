/// CityScope Service Library
///
/// Backend for a local-community feed: posts with mutually exclusive
/// like/dislike reactions, replies, paginated feeds, user profiles and
/// image uploads.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Posts, replies, users, reactions and pagination
/// - `services`: Business logic layer
/// - `db`: Repository traits with PostgreSQL and in-memory implementations
/// - `storage`: Image blob stores (S3, in-memory)
/// - `middleware`: Bearer authentication and request metrics
/// - `error`: Error types and the response envelope
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
/// - `routes`: Route table
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::AppState;
