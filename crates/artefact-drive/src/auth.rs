//! Service-account authentication for folder listing.
//!
//! Credentials arrive as a base64-encoded JSON key file. They are exchanged for an access token
//! with a signed JWT-bearer assertion; the token is reused until shortly before it expires.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{DriveError, DriveResult};

pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Cached tokens are refreshed this long before their reported expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Fields used from a service-account key file
#[derive(Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountCredentials {
    /// Decode a base64 key file. Escaped `\n` sequences in the private key become newlines.
    pub fn from_base64(encoded: &str) -> DriveResult<Self> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DriveError::Credentials(format!("not valid base64: {}", e)))?;
        let mut creds: ServiceAccountCredentials = serde_json::from_slice(&raw)
            .map_err(|e| DriveError::Credentials(format!("not a service account key: {}", e)))?;
        creds.private_key = creds.private_key.replace("\\n", "\n");
        Ok(creds)
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: DateTime<Utc>,
}

/// Access-token source for a service account
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(credentials: ServiceAccountCredentials, http: reqwest::Client) -> DriveResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| DriveError::Credentials(format!("invalid private key: {}", e)))?;
        Ok(Self {
            credentials,
            encoding_key,
            http,
            cached: RwLock::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Signed RS256 assertion requesting read-only drive access
    fn assertion(&self, now: DateTime<Utc>) -> DriveResult<String> {
        let claims = AssertionClaims {
            iss: &self.credentials.client_email,
            scope: DRIVE_READONLY_SCOPE,
            aud: self.credentials.token_uri(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| DriveError::Credentials(format!("failed to sign assertion: {}", e)))
    }

    /// Current access token, exchanging a fresh assertion when the cached one is stale.
    pub async fn access_token(&self) -> DriveResult<String> {
        let now = Utc::now();
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.refresh_at > now {
                return Ok(token.value.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if token.refresh_at > now {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.assertion(now)?;
        let response = self
            .http
            .post(self.credentials.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Service account token exchange failed");
            return Err(DriveError::Upstream {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let body = response.text().await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|_| DriveError::Upstream {
                status: Some(status.as_u16()),
                message: body.clone(),
            })?;

        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        let refresh_at = now + Duration::seconds((lifetime - EXPIRY_MARGIN_SECS).max(0));
        tracing::debug!(
            client_email = %self.credentials.client_email,
            expires_in = lifetime,
            "Obtained service account access token"
        );

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at,
        });
        Ok(token.access_token)
    }
}
