/// HTTP middleware for cityscope-service
///
/// Provides bearer-token authentication, request metrics and security headers.
pub mod auth;
pub mod metrics;
pub mod security;

pub use auth::{AuthenticatedUser, BearerAuth};
pub use metrics::MetricsMiddleware;
pub use security::security_headers;
