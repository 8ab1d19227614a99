//! External drive access for document ingestion.
//!
//! - [`DriveClient`]: folder validation, paginated listing and file download
//! - [`ServiceAccountAuth`]: token exchange for service-account listing
//! - [`PickerSession`]: interactive consent and file selection

pub mod auth;
pub mod client;
pub mod error;
pub mod picker;

pub use auth::{ServiceAccountAuth, ServiceAccountCredentials, DRIVE_READONLY_SCOPE};
pub use client::{
    is_valid_file_id, resolve_folder_id, DriveClient, DriveConfig, FolderListing, MY_DRIVE_URL,
};
pub use error::{DriveError, DriveResult};
pub use picker::{
    PickedDoc, PickerError, PickerOutcome, PickerProvider, PickerResponse, PickerSession,
    PickerState,
};
