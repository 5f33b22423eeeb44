//! Shared credential primitives for CityScope services
//!
//! - `jwt`: HS256 bearer tokens issued and validated with explicit [`jwt::JwtKeys`]
//! - `password`: Argon2id password hashing
//! - `hash`: content digests used for stored objects

pub mod hash;
pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtKeys, TokenError};
pub use password::{hash_password, verify_password, PasswordError};
