use std::sync::{Arc, LazyLock};
use std::time::Duration;

use artefact_core::models::{
    classify, format_size_text, is_allowed_extension, ExternalFileDescriptor,
};
use artefact_core::Config;
use bytes::Bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::{ServiceAccountAuth, ServiceAccountCredentials};
use crate::error::{DriveError, DriveResult};

/// Folder reference that stands for the caller's drive root
pub const MY_DRIVE_URL: &str = "https://drive.google.com/drive/my-drive";
const ROOT_FOLDER_ID: &str = "root";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const LIST_FIELDS: &str =
    "nextPageToken, files(id, name, mimeType, size, webViewLink, thumbnailLink, modifiedTime)";
const LIST_PAGE_SIZE: &str = "1000";

static FOLDER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\w]{25,}").expect("folder id pattern is valid"));
static FILE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-\w]+$").expect("file id pattern is valid"));

/// Drive ids only contain word characters and `-`; anything else must not reach a URL path.
pub fn is_valid_file_id(file_id: &str) -> bool {
    FILE_ID_PATTERN.is_match(file_id)
}

/// Extract the folder id from a drive URL, or map the my-drive sentinel to `root`.
pub fn resolve_folder_id(folder_url: &str) -> DriveResult<String> {
    let folder_url = folder_url.trim();
    if folder_url.is_empty() {
        return Err(DriveError::InvalidInput(
            "Google Drive folder URL is required".to_string(),
        ));
    }
    if folder_url == MY_DRIVE_URL {
        return Ok(ROOT_FOLDER_ID.to_string());
    }

    FOLDER_ID_PATTERN
        .find(folder_url)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| DriveError::InvalidInput("Invalid Google Drive folder URL".to_string()))
}

#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub api_base_url: String,
    pub export_base_url: String,
    /// Extra attempts after the first failed download
    pub download_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.googleapis.com".to_string(),
            export_base_url: "https://drive.google.com".to_string(),
            download_retries: 2,
            retry_base_delay: Duration::from_millis(250),
        }
    }
}

impl DriveConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_base_url: config.drive_api_base_url().trim_end_matches('/').to_string(),
            export_base_url: config
                .drive_export_base_url()
                .trim_end_matches('/')
                .to_string(),
            download_retries: config.drive_download_retries(),
            ..Self::default()
        }
    }
}

/// Allow-listed files of a folder plus the count of everything filtered out
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderListing {
    pub data: Vec<ExternalFileDescriptor>,
    pub other_files: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    web_view_link: Option<String>,
    #[serde(default)]
    thumbnail_link: Option<String>,
    #[serde(default)]
    modified_time: Option<String>,
}

impl From<DriveFile> for ExternalFileDescriptor {
    fn from(file: DriveFile) -> Self {
        let kind = classify(&file.name, &file.mime_type).label().to_string();
        ExternalFileDescriptor {
            size: format_size_text(file.size.as_deref()),
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            web_view_link: file.web_view_link,
            thumbnail_link: file.thumbnail_link,
            modified_time: file.modified_time,
            google_access_token: None,
            kind: Some(kind),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FolderProbe {
    #[serde(default)]
    id: Option<String>,
}

/// HTTP client for the external drive API
#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    config: DriveConfig,
    service_account: Option<Arc<ServiceAccountAuth>>,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, config: DriveConfig) -> Self {
        Self {
            http,
            config,
            service_account: None,
        }
    }

    /// Enable folder listing with the given service account
    pub fn with_service_account(
        mut self,
        credentials: ServiceAccountCredentials,
    ) -> DriveResult<Self> {
        let auth = ServiceAccountAuth::new(credentials, self.http.clone())?;
        tracing::info!(client_email = %auth.client_email(), "Drive service account configured");
        self.service_account = Some(Arc::new(auth));
        Ok(self)
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn has_service_account(&self) -> bool {
        self.service_account.is_some()
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/drive/v3/files/{}", self.config.api_base_url, file_id)
    }

    async fn service_token(&self) -> DriveResult<String> {
        match &self.service_account {
            Some(auth) => auth.access_token().await,
            None => Err(DriveError::MissingCredentials),
        }
    }

    /// Confirm the folder is visible to the service account.
    #[tracing::instrument(skip(self))]
    pub async fn validate_folder(&self, folder_id: &str) -> DriveResult<()> {
        let token = self.service_token().await?;

        let response = self
            .http
            .get(self.file_url(folder_id))
            .bearer_auth(&token)
            .query(&[("fields", "id")])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Folder lookup request failed");
                DriveError::FolderNotFound
            })?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Folder lookup rejected");
            return Err(DriveError::FolderNotFound);
        }

        match response.json::<FolderProbe>().await {
            Ok(FolderProbe { id: Some(id) }) if !id.is_empty() => Ok(()),
            _ => Err(DriveError::FolderNotFound),
        }
    }

    /// List the non-folder children of a folder, keeping only allow-listed extensions.
    #[tracing::instrument(skip(self))]
    pub async fn list_files(&self, folder_id: &str) -> DriveResult<FolderListing> {
        let token = self.service_token().await?;
        let query = format!(
            "'{}' in parents and trashed = false and mimeType != '{}'",
            folder_id, FOLDER_MIME_TYPE
        );

        let mut listing = FolderListing::default();
        let mut total = 0usize;
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", LIST_PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let response = self
                .http
                .get(format!("{}/drive/v3/files", self.config.api_base_url))
                .bearer_auth(&token)
                .query(&params)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(DriveError::Upstream {
                    status: Some(status.as_u16()),
                    message: body,
                });
            }
            let page: FileListPage =
                serde_json::from_str(&body).map_err(|_| DriveError::Upstream {
                    status: Some(status.as_u16()),
                    message: body.clone(),
                })?;

            total += page.files.len();
            listing.data.extend(
                page.files
                    .into_iter()
                    .filter(|file| is_allowed_extension(&file.name))
                    .map(ExternalFileDescriptor::from),
            );

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        listing.other_files = total - listing.data.len();
        tracing::info!(
            returned = listing.data.len(),
            other_files = listing.other_files,
            "Listed drive folder"
        );
        Ok(listing)
    }

    /// Fetch file content. Transient failures are retried with exponential backoff.
    #[tracing::instrument(skip(self, file), fields(file_id = %file.id, file = %file.name))]
    pub async fn download(&self, file: &ExternalFileDescriptor) -> DriveResult<Bytes> {
        if !is_valid_file_id(&file.id) {
            return Err(DriveError::InvalidInput(format!(
                "Invalid file data: {}",
                file.name
            )));
        }
        let mut attempt = 0u32;
        loop {
            match self.download_once(file).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_transient() && attempt < self.config.download_retries => {
                    let delay = self.config.retry_base_delay * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Drive download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn download_once(&self, file: &ExternalFileDescriptor) -> DriveResult<Bytes> {
        let request = match file.access_capability() {
            Some(token) => self
                .http
                .get(self.file_url(&file.id))
                .query(&[("alt", "media")])
                .bearer_auth(token),
            None => self
                .http
                .get(format!("{}/uc", self.config.export_base_url))
                .query(&[("export", "download"), ("id", file.id.as_str())]),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DriveError::Upstream {
                status: Some(status.as_u16()),
                message,
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(DriveError::EmptyBody(file.name.clone()));
        }
        Ok(body)
    }
}
