//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use artefact_core::AppError;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// The configured bucket does not exist. Fatal until configuration changes.
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Credentials lack permission on the bucket or key.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigError(msg) => {
                AppError::Internal(format!("Storage configuration error: {}", msg))
            }
            StorageError::IoError(e) => AppError::Internal(format!("Storage IO error: {}", e)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// Implemented by the S3 and local filesystem backends. Callers build keys with
/// [`crate::keys::document_key`] so every backend sees the same layout.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `storage_key`, replacing any existing object, and return its public URL.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Public URL of the object stored under `storage_key`
    fn public_url(&self, storage_key: &str) -> String;

    /// Bucket name, for backends that have one
    fn bucket(&self) -> Option<&str> {
        None
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
