use crate::auth::identity::{bearer_token, IdentityVerifier};
use crate::auth::models::TenantContext;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Verify the bearer token and attach a [`TenantContext`] to the request.
pub async fn auth_middleware(
    State(verifier): State<Arc<IdentityVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let token = bearer_token(header).map(str::to_string);

    let identity = match verifier.verify(token.as_deref()) {
        Ok(identity) => identity,
        Err(e) => return HttpAppError(e).into_response(),
    };

    tracing::debug!(
        user_id = identity.user_id,
        org_id = identity.organization_id,
        "Request authenticated"
    );

    request.extensions_mut().insert(TenantContext {
        identity,
        bearer_token: token.unwrap_or_default(),
    });

    next.run(request).await
}
