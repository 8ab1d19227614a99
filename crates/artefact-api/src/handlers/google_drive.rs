//! Drive folder listing and document ingestion handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::auth::TenantContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::middleware::RequestId;
use crate::services::IngestionJob;
use crate::state::AppState;
use artefact_core::models::{ExternalFileDescriptor, FileFailure, UploadSummary};
use artefact_core::AppError;
use artefact_drive::resolve_folder_id;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchFolderRequest {
    /// Folder share link, or the "My Drive" URL for the root folder
    #[serde(default)]
    pub folder_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderListingResponse {
    pub status_code: u16,
    pub status: String,
    pub message: String,
    pub data: Vec<ExternalFileDescriptor>,
    /// Files in the folder that were filtered out by the extension allow-list
    pub other_files: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestFilesRequest {
    #[serde(default)]
    pub selected_file_details: Option<Vec<ExternalFileDescriptor>>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestFilesResponse {
    pub status_code: u16,
    pub status: String,
    pub message: String,
    pub files: Vec<UploadSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FileFailure>,
}

/// List the allow-listed files of a drive folder with the service account
#[utoipa::path(
    post,
    path = "/api/artefacts/google-drive-fetch",
    request_body = FetchFolderRequest,
    responses(
        (status = 201, description = "Folder listed", body = FolderListingResponse),
        (status = 400, description = "Invalid folder URL, missing credentials or unknown folder"),
        (status = 500, description = "Internal server error"),
        (status = 502, description = "Drive API failure")
    ),
    tag = "google-drive"
)]
#[tracing::instrument(skip(state, request))]
pub async fn fetch_folder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<FetchFolderRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let folder_url = request
        .folder_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Google Drive folder URL is required".to_string()))?;

    let folder_id = resolve_folder_id(folder_url.trim())?;
    let drive = &state.drive;
    drive.validate_folder(&folder_id).await?;
    let listing = drive.list_files(&folder_id).await?;

    let message = if listing.data.is_empty() {
        "No files found"
    } else {
        "Files fetched successfully"
    };

    Ok((
        StatusCode::CREATED,
        Json(FolderListingResponse {
            status_code: 201,
            status: "success".to_string(),
            message: message.to_string(),
            data: listing.data,
            other_files: listing.other_files,
        }),
    ))
}

/// Copy selected drive files into object storage and queue them for processing
///
/// The batch keeps running after a client disconnect only long enough to mark the rows it wrote
/// as failed.
#[utoipa::path(
    post,
    path = "/api/artefacts/google-drive",
    request_body = IngestFilesRequest,
    responses(
        (status = 201, description = "Files stored and queued for processing", body = IngestFilesResponse),
        (status = 400, description = "No files, missing category or invalid file data"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User or organization not found"),
        (status = 500, description = "Storage or internal failure"),
        (status = 502, description = "Drive download failure or ingestion cancelled")
    ),
    security(("bearer" = [])),
    tag = "google-drive"
)]
#[tracing::instrument(skip(state, ctx, request_id, request))]
pub async fn ingest_files(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    request_id: RequestId,
    ValidatedJson(request): ValidatedJson<IngestFilesRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let job = IngestionJob {
        identity: ctx.identity,
        bearer_token: ctx.bearer_token,
        files: request.selected_file_details.unwrap_or_default(),
        category: request.category.unwrap_or_default(),
        request_id: Some(request_id.0),
    };

    // Dropping this handler (client gone) cancels the batch; the spawned task still cleans up.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let ingestion = state.ingestion.clone();
    let result = tokio::spawn(async move { ingestion.ingest(job, cancel).await })
        .await
        .map_err(|e| AppError::Internal(format!("Ingestion task failed: {}", e)))??;

    Ok((
        StatusCode::CREATED,
        Json(IngestFilesResponse {
            status_code: 201,
            status: "success".to_string(),
            message: "Files uploaded successfully to S3".to_string(),
            files: result.files,
            failures: result.failures,
        }),
    ))
}
