//! Shared key generation for storage backends.
//!
//! Key format: `{prefix}/{org_slug}/files/{file_name}`, or `{org_slug}/files/{file_name}` when
//! no prefix is configured.

use artefact_core::models::org_slug;

use crate::traits::{StorageError, StorageResult};

/// Folder holding an organization's documents, with a trailing `/`.
pub fn document_prefix(prefix: &str, org_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let slug = org_slug(org_name);
    if prefix.is_empty() {
        format!("{}/files/", slug)
    } else {
        format!("{}/{}/files/", prefix, slug)
    }
}

/// Storage key for a document. Deterministic in `(prefix, org_name, file_name)`.
pub fn document_key(prefix: &str, org_name: &str, file_name: &str) -> StorageResult<String> {
    if file_name.is_empty() {
        return Err(StorageError::InvalidKey("File name is empty".to_string()));
    }
    if file_name.starts_with('/') || file_name.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "File name '{}' is not a valid storage key segment",
            file_name
        )));
    }
    if org_name.contains("..") || org_name.contains('/') {
        return Err(StorageError::InvalidKey(format!(
            "Organization name '{}' is not a valid storage key segment",
            org_name
        )));
    }
    Ok(format!("{}{}", document_prefix(prefix, org_name), file_name))
}
