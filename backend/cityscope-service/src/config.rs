/// Configuration management for CityScope Service
///
/// Everything is read from environment variables (an optional `.env` file is
/// loaded by the binary first). Collaborator settings are plain values handed
/// to constructors; nothing here is process-global.
use db_pool::DbConfig;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const DEV_JWT_SECRET: &str = "cityscope-development-secret-do-not-deploy";
const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    /// Present only when the PostgreSQL store is selected
    pub database: Option<DbConfig>,
    pub store: StoreBackend,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }
}

/// Which persistence backend serves the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Unknown STORE_BACKEND '{}'", other)),
        }
    }
}

/// Bearer-token settings
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expire_hours", &self.jwt_expire_hours)
            .finish()
    }
}

/// Image blob store settings
#[derive(Debug, Clone, Serialize)]
pub struct StorageConfig {
    /// S3 bucket; when unset, images are kept by the in-process store
    pub s3_bucket: Option<String>,
    pub aws_region: String,
    /// Base URL public image links are built from
    pub public_base_url: String,
    pub key_prefix: String,
    pub upload_timeout_ms: u64,
    pub max_image_bytes: usize,
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, String> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("Failed to parse {}='{}'", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let app_env = lookup("APP_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let app = AppConfig {
            env: app_env,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 5000)?,
        };

        let cors = {
            let allowed_origins =
                lookup("CLIENT_URL").unwrap_or_else(|| "http://localhost:3000".to_string());
            if production && allowed_origins.trim() == "*" {
                return Err("CLIENT_URL cannot be '*' in production".to_string());
            }
            CorsConfig { allowed_origins }
        };

        let store = match lookup("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Postgres,
        };
        if production && store == StoreBackend::Memory {
            return Err("STORE_BACKEND=memory is not allowed in production".to_string());
        }

        let database = match store {
            StoreBackend::Postgres => Some(DbConfig::from_lookup("cityscope-service", &lookup)?),
            StoreBackend::Memory => None,
        };

        let auth = {
            let jwt_secret = match lookup("JWT_SECRET") {
                Some(secret) => secret,
                None if production => {
                    return Err("JWT_SECRET must be set in production".to_string())
                }
                None => DEV_JWT_SECRET.to_string(),
            };
            if jwt_secret.len() < crypto_core::jwt::MIN_SECRET_BYTES {
                return Err(format!(
                    "JWT_SECRET must be at least {} bytes",
                    crypto_core::jwt::MIN_SECRET_BYTES
                ));
            }
            let jwt_expire_hours = parse_or(&lookup, "JWT_EXPIRE_HOURS", 168)?;
            if !(1..=crypto_core::jwt::MAX_TTL_HOURS).contains(&jwt_expire_hours) {
                return Err(format!(
                    "JWT_EXPIRE_HOURS must be between 1 and {}",
                    crypto_core::jwt::MAX_TTL_HOURS
                ));
            }
            AuthConfig {
                jwt_secret,
                jwt_expire_hours,
            }
        };

        let storage = {
            let s3_bucket = lookup("S3_BUCKET").filter(|b| !b.trim().is_empty());
            if production && s3_bucket.is_none() {
                return Err("S3_BUCKET must be set in production".to_string());
            }
            let aws_region = lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string());
            let public_base_url = lookup("S3_PUBLIC_BASE_URL")
                .or_else(|| {
                    s3_bucket
                        .as_ref()
                        .map(|bucket| format!("https://{}.s3.{}.amazonaws.com", bucket, aws_region))
                })
                .unwrap_or_else(|| format!("http://localhost:{}/uploads", app.port));

            StorageConfig {
                s3_bucket,
                aws_region,
                public_base_url: public_base_url.trim_end_matches('/').to_string(),
                key_prefix: lookup("S3_KEY_PREFIX")
                    .unwrap_or_else(|| "cityscope/posts".to_string())
                    .trim_matches('/')
                    .to_string(),
                upload_timeout_ms: parse_or(&lookup, "UPLOAD_TIMEOUT_MS", 10_000)?,
                max_image_bytes: parse_or(&lookup, "MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
            }
        };

        Ok(Config {
            app,
            cors,
            database,
            store,
            auth,
            storage,
        })
    }
}
