/// Integration tests for crypto-core credential helpers
///
/// Covers the issue -> validate cycle across independently built key sets and
/// the password hash round trip through the public API.
use crypto_core::{hash_password, verify_password, JwtKeys, TokenError};
use uuid::Uuid;

const SECRET: &str = "integration-secret-with-32-bytes!!";

#[test]
fn test_keys_built_from_same_secret_interoperate() {
    let issuer = JwtKeys::new(SECRET, 24).unwrap();
    let verifier = JwtKeys::new(SECRET, 1).unwrap();

    let user_id = Uuid::new_v4();
    let token = issuer.issue(user_id, "neighbour").unwrap();
    let claims = verifier.validate(&token).unwrap();

    assert_eq!(claims.user_id().unwrap(), user_id);
    assert_eq!(issuer.ttl_seconds(), 24 * 3600);
}

#[test]
fn test_tampered_token_rejected() {
    let keys = JwtKeys::new(SECRET, 1).unwrap();
    let token = keys.issue(Uuid::new_v4(), "neighbour").unwrap();

    let mut parts: Vec<&str> = token.split('.').collect();
    parts[2] = "c2lnbmF0dXJl";
    let tampered = parts.join(".");

    assert!(matches!(
        keys.validate(&tampered),
        Err(TokenError::Invalid(_))
    ));
}

#[test]
fn test_password_round_trip() {
    let hash = hash_password("correct horse").unwrap();
    assert!(verify_password("correct horse", &hash).unwrap());
    assert!(!verify_password("wrong horse", &hash).unwrap());
}
