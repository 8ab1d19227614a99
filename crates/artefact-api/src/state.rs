//! Application state shared by every handler.
//!
//! Repositories are held as trait objects so the router can run against the in-memory doubles
//! of `artefact-db` in tests.

use crate::auth::IdentityVerifier;
use crate::services::IngestionService;
use artefact_db::{CategoryRepositoryTrait, DocumentRepositoryTrait, OrganizationRepositoryTrait};
use artefact_drive::DriveClient;
use artefact_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Repositories for the tables this service owns, plus the read-only organization lookup.
#[derive(Clone)]
pub struct DbState {
    /// `None` when running against in-memory repositories
    pub pool: Option<PgPool>,
    pub categories: Arc<dyn CategoryRepositoryTrait>,
    pub documents: Arc<dyn DocumentRepositoryTrait>,
    pub organizations: Arc<dyn OrganizationRepositoryTrait>,
}

pub struct AppState {
    pub db: DbState,
    pub storage: Arc<dyn Storage>,
    pub drive: DriveClient,
    pub ingestion: Arc<IngestionService>,
    pub verifier: Arc<IdentityVerifier>,
}
