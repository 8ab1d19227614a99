use crate::error::HttpAppError;
use artefact_core::models::TenantIdentity;
use artefact_core::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Verified identity plus the raw bearer token, stored in request extensions by
/// [`crate::auth::auth_middleware`].
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub identity: TenantIdentity,
    /// Forwarded to the document processor
    pub bearer_token: String,
}

impl TenantContext {
    pub fn require_org(&self) -> Result<i64, AppError> {
        self.identity.require_org()
    }

    pub fn require_user(&self) -> Result<i64, AppError> {
        self.identity.require_user()
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    crate::auth::identity::NO_TOKEN_MESSAGE.to_string(),
                ))
            })
    }
}
