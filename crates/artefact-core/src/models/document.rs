use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of an organization document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Ready,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Processing => "processing",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(DocumentStatus::Processing),
            "ready" => Ok(DocumentStatus::Ready),
            "failed" => Ok(DocumentStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid document status: {}", s)),
        }
    }
}

impl Display for DocumentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Where a document came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Gdrive,
    Upload,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Gdrive => "gdrive",
            SourceType::Upload => "upload",
        }
    }
}

/// Row of `organization_documents`.
///
/// `status` and `doc_type` are stored as text; use [`DocumentRecord::parsed_status`] for the typed value.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DocumentRecord {
    pub id: i64,
    pub org_id: i64,
    pub doc_type: String,
    pub document_link: String,
    pub status: String,
    pub file_category: String,
    pub name: String,
    pub content_type: Option<String>,
    pub file_size: Option<i64>,
    pub summary: Option<String>,
    pub is_summarized: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn parsed_status(&self) -> Option<DocumentStatus> {
        self.status.parse().ok()
    }
}

/// Values written by a document upsert, keyed on `(org_id, name)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpsert {
    pub org_id: i64,
    pub name: String,
    pub source: SourceType,
    pub document_link: String,
    pub category: String,
    pub content_type: String,
    pub file_size: Option<i64>,
}

/// Result of an upsert: the row id and whether a new row was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UpsertOutcome {
    pub id: i64,
    pub inserted: bool,
}

/// Document handed to the downstream processor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ProcessingDocument {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link: String,
}

/// Per-file summary returned by the ingest endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub name: String,
    pub public_url: String,
    pub content_type: String,
    pub size: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A file that failed under the isolated batch policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct FileFailure {
    pub name: String,
    pub message: String,
}
