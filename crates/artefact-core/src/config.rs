//! Configuration module
//!
//! Settings are read from the process environment (after loading `.env` if present). Optional
//! values fall back to defaults; required ones and invalid combinations fail at startup.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MIN_JWT_SECRET_LEN: usize = 32;
const DEFAULT_KEY_PREFIX: &str = "artefacts";
const DEFAULT_DRIVE_API_BASE_URL: &str = "https://www.googleapis.com";
const DEFAULT_DRIVE_EXPORT_BASE_URL: &str = "https://drive.google.com";
const DRIVE_DOWNLOAD_RETRIES: u32 = 2;
const INGEST_CONCURRENCY: usize = 4;
const INGEST_TIMEOUT_SECS: u64 = 300;

/// How a multi-file ingestion reacts to a failing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// First failure aborts the batch and marks its records failed
    #[default]
    AllOrNothing,
    /// Failures are reported per file; successes are kept
    Isolated,
}

impl FromStr for BatchPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all_or_nothing" | "all-or-nothing" => Ok(BatchPolicy::AllOrNothing),
            "isolated" => Ok(BatchPolicy::Isolated),
            _ => Err(anyhow::anyhow!("Invalid ingest batch policy: {}", s)),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "pretty" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Server settings shared by every entry point
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
    pub log_format: LogFormat,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Object storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_key_prefix: String,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // External drive
    pub google_credentials_base64: Option<String>,
    pub google_client_id: Option<String>,
    pub drive_api_base_url: String,
    pub drive_export_base_url: String,
    pub drive_download_retries: u32,
    // Ingestion
    pub ingest_concurrency: usize,
    pub ingest_timeout_secs: u64,
    pub ingest_batch_policy: BatchPolicy,
    pub document_processor_url: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary key lookup. Does not validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_empty(lookup(key));

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: var("PORT")
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: var("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
            log_format: var("LOG_FORMAT")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or_default(),
        };

        let storage_backend = var("STORAGE_BACKEND")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(StorageBackend::S3);

        Ok(AppConfig {
            base,
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            s3_key_prefix: var("S3_KEY_PREFIX")
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            google_credentials_base64: var("GOOGLE_APPLICATION_CREDENTIALS_BASE64"),
            google_client_id: var("GOOGLE_CLIENT_ID"),
            drive_api_base_url: var("DRIVE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_DRIVE_API_BASE_URL.to_string()),
            drive_export_base_url: var("DRIVE_EXPORT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_DRIVE_EXPORT_BASE_URL.to_string()),
            drive_download_retries: var("DRIVE_DOWNLOAD_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DRIVE_DOWNLOAD_RETRIES),
            ingest_concurrency: var("INGEST_CONCURRENCY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(INGEST_CONCURRENCY)
                .max(1),
            ingest_timeout_secs: var("INGEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(INGEST_TIMEOUT_SECS),
            ingest_batch_policy: var("INGEST_BATCH_POLICY")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or_default(),
            document_processor_url: var("DOCUMENT_PROCESSOR_URL"),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Application configuration handle passed to setup code.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config(Box::new(AppConfig::from_env()?)))
    }

    pub fn inner(&self) -> &AppConfig {
        &self.0
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.0.validate()
    }

    pub fn is_production(&self) -> bool {
        self.0.is_production()
    }

    pub fn server_port(&self) -> u16 {
        self.0.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.0.base.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.0.base.jwt_secret
    }

    pub fn environment(&self) -> &str {
        &self.0.base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.0.base.log_format
    }

    pub fn database_url(&self) -> &str {
        &self.0.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.0.base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.0.base.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.0.storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.0.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.0.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.0.s3_endpoint.as_deref()
    }

    pub fn s3_key_prefix(&self) -> &str {
        &self.0.s3_key_prefix
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.0.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.0.local_storage_base_url.as_deref()
    }

    pub fn google_credentials_base64(&self) -> Option<&str> {
        self.0.google_credentials_base64.as_deref()
    }

    pub fn google_client_id(&self) -> Option<&str> {
        self.0.google_client_id.as_deref()
    }

    pub fn drive_api_base_url(&self) -> &str {
        &self.0.drive_api_base_url
    }

    pub fn drive_export_base_url(&self) -> &str {
        &self.0.drive_export_base_url
    }

    pub fn drive_download_retries(&self) -> u32 {
        self.0.drive_download_retries
    }

    pub fn ingest_concurrency(&self) -> usize {
        self.0.ingest_concurrency
    }

    pub fn ingest_timeout_secs(&self) -> u64 {
        self.0.ingest_timeout_secs
    }

    pub fn ingest_batch_policy(&self) -> BatchPolicy {
        self.0.ingest_batch_policy
    }

    pub fn document_processor_url(&self) -> Option<&str> {
        self.0.document_processor_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/artefact"),
        ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ("S3_BUCKET", "docs"),
        ("AWS_REGION", "eu-west-1"),
    ];

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.base.server_port, 4000);
        assert_eq!(config.base.db_max_connections, 20);
        assert_eq!(config.s3_region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.s3_key_prefix, "artefacts");
        assert_eq!(config.ingest_concurrency, 4);
        assert_eq!(config.ingest_timeout_secs, 300);
        assert_eq!(config.drive_download_retries, 2);
        assert_eq!(config.ingest_batch_policy, BatchPolicy::AllOrNothing);
        assert_eq!(config.base.log_format, LogFormat::Compact);
        assert!(config.document_processor_url.is_none());
    }

    #[test]
    fn test_missing_required_keys() {
        let err = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "x")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let err =
            AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut pairs: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "JWT_SECRET")
            .collect();
        pairs.push(("JWT_SECRET", "short"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ENVIRONMENT", "production"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_local_backend_requires_path() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STORAGE_BACKEND", "local"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LOCAL_STORAGE_PATH"));
    }

    #[test]
    fn test_concurrency_floor_and_policy() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("INGEST_CONCURRENCY", "0"));
        pairs.push(("INGEST_BATCH_POLICY", "isolated"));
        pairs.push(("S3_KEY_PREFIX", "/tenants/"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.ingest_concurrency, 1);
        assert_eq!(config.ingest_batch_policy, BatchPolicy::Isolated);
        assert_eq!(config.s3_key_prefix, "tenants");
    }

    #[test]
    fn test_invalid_policy_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("INGEST_BATCH_POLICY", "sometimes"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }
}
