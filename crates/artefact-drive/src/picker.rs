//! Consent and file-selection cycle for the interactive picker.
//!
//! A [`PickerSession`] walks `Idle → Authenticating → PickerOpen → Picked | Cancelled → Idle`
//! against a [`PickerProvider`]. Only one cycle runs per session at a time.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use artefact_core::models::{
    file_extension, format_size_kb, mime_label as known_mime_label, ExternalFileDescriptor,
    PICKER_MIME_TYPES,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::auth::DRIVE_READONLY_SCOPE;

pub const CONSENT_PROMPT: &str = "consent";
pub const NO_VALID_FILES_MESSAGE: &str = "No valid files selected (either .log or unsupported files).";
pub const CANCELLED_MESSAGE: &str = "File picker cancelled.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Idle,
    Authenticating,
    PickerOpen,
    Picked,
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickerError {
    #[error("A file selection is already in progress")]
    Busy,

    #[error("Google Client ID is missing.")]
    MissingClientId,

    #[error("{0}")]
    Provider(String),
}

/// Document as reported by the picker widget
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickedDoc {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: Option<u64>,
    pub url: Option<String>,
    pub icon_url: Option<String>,
    /// Milliseconds since the Unix epoch
    pub last_edited_utc: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerResponse {
    Picked(Vec<PickedDoc>),
    Cancelled,
    Error(String),
}

/// Boundary to the consent flow and picker widget
#[async_trait]
pub trait PickerProvider: Send + Sync {
    /// Load whatever the picker needs. Called at most once per session.
    async fn ensure_ready(&self) -> Result<(), PickerError>;

    /// Ask the user for access and return the capability token.
    async fn request_access(
        &self,
        client_id: &str,
        scope: &str,
        prompt: &str,
    ) -> Result<String, PickerError>;

    async fn open_picker(&self, token: &str, mime_types: &[&str]) -> PickerResponse;

    async fn close_picker(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    Selected {
        message: String,
        files: Vec<ExternalFileDescriptor>,
    },
    /// Every picked file was filtered out; the continuation did not run.
    NoValidFiles { message: String },
    Cancelled { message: String },
}

impl PickerOutcome {
    pub fn message(&self) -> &str {
        match self {
            PickerOutcome::Selected { message, .. }
            | PickerOutcome::NoValidFiles { message }
            | PickerOutcome::Cancelled { message } => message,
        }
    }
}

fn selection_message(count: usize) -> String {
    if count == 1 {
        "Selected 1 file from Google Drive".to_string()
    } else {
        format!("Selected {} files from Google Drive", count)
    }
}

fn to_descriptor(doc: PickedDoc, token: &str) -> ExternalFileDescriptor {
    let kind = known_mime_label(&doc.mime_type).map(str::to_string);
    ExternalFileDescriptor {
        size: format_size_kb(doc.size_bytes),
        modified_time: doc
            .last_edited_utc
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|t| t.to_rfc3339()),
        id: doc.id,
        name: doc.name,
        mime_type: doc.mime_type,
        web_view_link: doc.url,
        thumbnail_link: doc.icon_url,
        google_access_token: Some(token.to_string()),
        kind,
    }
}

fn is_selectable(file: &ExternalFileDescriptor) -> bool {
    file_extension(&file.name) != "log" && known_mime_label(&file.mime_type).is_some()
}

/// Clears the loading flag when a cycle ends, however it ends
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PickerSession<P: PickerProvider> {
    provider: P,
    client_id: Option<String>,
    ready: OnceCell<()>,
    is_loading: AtomicBool,
    state: Mutex<PickerState>,
    token: Mutex<Option<String>>,
}

impl<P: PickerProvider> PickerSession<P> {
    pub fn new(provider: P, client_id: Option<String>) -> Self {
        Self {
            provider,
            client_id: client_id.filter(|id| !id.trim().is_empty()),
            ready: OnceCell::new(),
            is_loading: AtomicBool::new(false),
            state: Mutex::new(PickerState::Idle),
            token: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PickerState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(PickerState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::Acquire)
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn set_state(&self, next: PickerState) {
        if let Ok(mut state) = self.state.lock() {
            tracing::debug!(from = ?*state, to = ?next, "Picker state change");
            *state = next;
        }
    }

    fn set_token(&self, value: Option<String>) {
        if let Ok(mut token) = self.token.lock() {
            *token = value;
        }
    }

    /// Run one selection cycle without a continuation.
    pub async fn select(&self) -> Result<PickerOutcome, PickerError> {
        self.select_files(None::<fn(Vec<ExternalFileDescriptor>) -> std::future::Ready<()>>)
            .await
    }

    /// Run one selection cycle. The continuation receives the filtered files when at least
    /// one survives.
    pub async fn select_files<F, Fut>(
        &self,
        continuation: Option<F>,
    ) -> Result<PickerOutcome, PickerError>
    where
        F: FnOnce(Vec<ExternalFileDescriptor>) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let client_id = self.client_id.clone().ok_or(PickerError::MissingClientId)?;

        if self
            .is_loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PickerError::Busy);
        }
        let _loading = LoadingGuard(&self.is_loading);

        let result = self.run_cycle(&client_id, continuation).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "File selection failed");
        }
        self.set_state(PickerState::Idle);
        result
    }

    async fn run_cycle<F, Fut>(
        &self,
        client_id: &str,
        continuation: Option<F>,
    ) -> Result<PickerOutcome, PickerError>
    where
        F: FnOnce(Vec<ExternalFileDescriptor>) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        self.ready
            .get_or_try_init(|| self.provider.ensure_ready())
            .await?;

        self.set_state(PickerState::Authenticating);
        let token = self
            .provider
            .request_access(client_id, DRIVE_READONLY_SCOPE, CONSENT_PROMPT)
            .await?;
        self.set_token(Some(token.clone()));

        self.set_state(PickerState::PickerOpen);
        let mime_types: Vec<&str> = PICKER_MIME_TYPES.iter().map(|(mime, _)| *mime).collect();

        match self.provider.open_picker(&token, &mime_types).await {
            PickerResponse::Picked(docs) => {
                self.set_state(PickerState::Picked);
                let picked = docs.len();
                let files: Vec<_> = docs
                    .into_iter()
                    .map(|doc| to_descriptor(doc, &token))
                    .filter(is_selectable)
                    .collect();

                if files.is_empty() {
                    tracing::info!(picked, "No selectable files in picker result");
                    return Ok(PickerOutcome::NoValidFiles {
                        message: NO_VALID_FILES_MESSAGE.to_string(),
                    });
                }

                let message = selection_message(files.len());
                tracing::info!(picked, selected = files.len(), "Files selected from drive");
                self.provider.close_picker().await;
                if let Some(continuation) = continuation {
                    continuation(files.clone()).await;
                }
                Ok(PickerOutcome::Selected { message, files })
            }
            PickerResponse::Cancelled => {
                self.set_state(PickerState::Cancelled);
                Ok(PickerOutcome::Cancelled {
                    message: CANCELLED_MESSAGE.to_string(),
                })
            }
            PickerResponse::Error(reason) => Err(PickerError::Provider(reason)),
        }
    }

    /// Close the picker and forget the capability token.
    pub async fn cleanup(&self) {
        self.provider.close_picker().await;
        self.set_token(None);
        self.set_state(PickerState::Idle);
    }

    pub fn file_exists(name: &str, existing: &[ExternalFileDescriptor]) -> bool {
        existing.iter().any(|file| file.name == name)
    }

    pub fn mime_label(mime_type: &str) -> Option<&'static str> {
        known_mime_label(mime_type)
    }
}
