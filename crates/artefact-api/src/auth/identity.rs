//! HS256 bearer verification
//!
//! Tokens are issued by the account subsystem and carry `user_id` and/or `org_id`. Ids may be
//! encoded as JSON numbers or numeric strings.

use artefact_core::models::TenantIdentity;
use artefact_core::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};

pub const NO_TOKEN_MESSAGE: &str = "Unauthorized: No token provided";
pub const INVALID_TOKEN_MESSAGE: &str = "Unauthorized: Invalid token";

/// Claims read from a verified token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub org_id: Option<i64>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// Token after the first space of an `Authorization` header value, as in `Bearer <token>`.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.split(' ').nth(1))
        .filter(|token| !token.is_empty())
}

#[derive(Clone)]
pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a bearer token and return the identity it carries.
    pub fn verify(&self, token: Option<&str>) -> Result<TenantIdentity, AppError> {
        let token = token.ok_or_else(|| AppError::Unauthorized(NO_TOKEN_MESSAGE.to_string()))?;

        let data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Bearer token rejected");
                AppError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
            })?;

        TenantIdentity::new(data.claims.user_id, data.claims.org_id)
    }
}
