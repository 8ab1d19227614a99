//! Storage setup and initialization

use anyhow::{Context, Result};
use artefact_core::Config;
use artefact_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(
        backend = ?storage.backend_type(),
        bucket = storage.bucket().unwrap_or("-"),
        key_prefix = %config.s3_key_prefix(),
        "Storage initialized"
    );
    Ok(storage)
}
