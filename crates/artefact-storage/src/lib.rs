//! Artefact Storage Library
//!
//! Object storage for imported documents, behind the `Storage` trait. Backends: S3 (through
//! `object_store`) and the local filesystem.
//!
//! # Storage key format
//!
//! Documents live at `{prefix}/{org_slug}/files/{file_name}`, where `prefix` is the configured
//! namespace and `org_slug` the lowercased organization name with spaces replaced by `_`. The
//! same file name in the same organization always maps to the same key, so a re-import
//! overwrites the previous object.
//!
//! Keys must not contain `..` or a leading `/`. Key generation lives in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

pub use artefact_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{document_key, document_prefix};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
