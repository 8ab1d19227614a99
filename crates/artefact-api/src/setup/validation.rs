//! Configuration validation
//!
//! Checks run at startup, on top of `AppConfig::validate`, so misconfiguration fails fast.

use anyhow::Result;
use artefact_core::Config;

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }

    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    if config.ingest_timeout_secs() == 0 {
        return Err(anyhow::anyhow!("INGEST_TIMEOUT_SECS cannot be 0"));
    }

    if config.ingest_concurrency() > 32 {
        tracing::warn!(
            ingest_concurrency = config.ingest_concurrency(),
            "INGEST_CONCURRENCY is very high - each slot holds a whole file in memory"
        );
    }

    if config.google_credentials_base64().is_none() {
        tracing::warn!(
            "GOOGLE_APPLICATION_CREDENTIALS_BASE64 not set - folder listing will be rejected"
        );
    }

    if config.document_processor_url().is_none() {
        tracing::warn!("DOCUMENT_PROCESSOR_URL not set - ingested documents will not be processed");
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
