//! Bearer-token verification and the per-request tenant context

pub mod identity;
pub mod middleware;
pub mod models;

pub use identity::{IdentityClaims, IdentityVerifier};
pub use middleware::auth_middleware;
pub use models::TenantContext;
