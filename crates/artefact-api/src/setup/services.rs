//! Service initialization and application state setup

use crate::auth::IdentityVerifier;
use crate::services::{
    DocumentProcessor, HttpDocumentProcessor, IngestionService, IngestionSettings,
    NoopDocumentProcessor,
};
use crate::state::{AppState, DbState};
use anyhow::{Context, Result};
use artefact_core::Config;
use artefact_db::{CategoryRepository, DocumentRepository, OrganizationRepository};
use artefact_drive::{DriveClient, DriveConfig, ServiceAccountCredentials};
use artefact_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Initialize repositories and external clients, returning the application state
pub async fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let db = DbState {
        pool: Some(pool.clone()),
        categories: Arc::new(CategoryRepository::new(pool.clone())),
        documents: Arc::new(DocumentRepository::new(pool.clone())),
        organizations: Arc::new(OrganizationRepository::new(pool)),
    };

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    let mut drive = DriveClient::new(http.clone(), DriveConfig::from_config(config));
    if let Some(encoded) = config.google_credentials_base64() {
        let credentials = ServiceAccountCredentials::from_base64(encoded)
            .context("Invalid GOOGLE_APPLICATION_CREDENTIALS_BASE64")?;
        drive = drive
            .with_service_account(credentials)
            .context("Failed to configure drive service account")?;
    }

    let processor: Arc<dyn DocumentProcessor> = match config.document_processor_url() {
        Some(url) => {
            tracing::info!(url = %url, "Document processor configured");
            Arc::new(HttpDocumentProcessor::new(http, url))
        }
        None => Arc::new(NoopDocumentProcessor),
    };

    Ok(build_state(config, db, storage, drive, processor))
}

/// Assemble the state from already-built parts
pub fn build_state(
    config: &Config,
    db: DbState,
    storage: Arc<dyn Storage>,
    drive: DriveClient,
    processor: Arc<dyn DocumentProcessor>,
) -> Arc<AppState> {
    let settings = IngestionSettings::from_config(config);
    tracing::info!(
        concurrency = settings.concurrency,
        timeout_secs = settings.timeout.as_secs(),
        policy = ?settings.policy,
        "Ingestion service configured"
    );

    let ingestion = Arc::new(IngestionService::new(
        drive.clone(),
        storage.clone(),
        db.documents.clone(),
        db.organizations.clone(),
        processor,
        settings,
    ));

    Arc::new(AppState {
        db,
        storage,
        drive,
        ingestion,
        verifier: Arc::new(IdentityVerifier::new(config.jwt_secret())),
    })
}
