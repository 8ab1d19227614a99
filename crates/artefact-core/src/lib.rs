//! Artefact Core Library
//!
//! Domain models, error types, configuration and validation shared by every Artefact crate.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

pub use config::{AppConfig, BaseConfig, BatchPolicy, Config, LogFormat};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
