//! Bearer tokens signed with the test secret.

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-with-32-plus-chars";

pub const USER_ID: i64 = 7;
pub const ORG_ID: i64 = 42;
pub const OTHER_USER_ID: i64 = 8;
pub const OTHER_ORG_ID: i64 = 99;

fn sign(claims: serde_json::Value, secret: &str) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn expires_in(seconds: i64) -> i64 {
    chrono::Utc::now().timestamp() + seconds
}

/// Token carrying both ids
pub fn token_for(user_id: i64, org_id: i64) -> String {
    sign(
        json!({ "user_id": user_id, "org_id": org_id, "exp": expires_in(3600) }),
        TEST_JWT_SECRET,
    )
}

/// Token without an organization claim
pub fn user_only_token(user_id: i64) -> String {
    sign(
        json!({ "user_id": user_id, "exp": expires_in(3600) }),
        TEST_JWT_SECRET,
    )
}

/// Token without a user claim
pub fn org_only_token(org_id: i64) -> String {
    sign(
        json!({ "org_id": org_id, "exp": expires_in(3600) }),
        TEST_JWT_SECRET,
    )
}

pub fn expired_token() -> String {
    sign(
        json!({ "user_id": USER_ID, "org_id": ORG_ID, "exp": expires_in(-3600) }),
        TEST_JWT_SECRET,
    )
}

pub fn foreign_token() -> String {
    sign(
        json!({ "user_id": USER_ID, "org_id": ORG_ID, "exp": expires_in(3600) }),
        "some-other-secret-that-is-long-enough-too",
    )
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
