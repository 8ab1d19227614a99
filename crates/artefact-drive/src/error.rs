use artefact_core::AppError;
use thiserror::Error;

/// Errors raised while talking to the external drive
#[derive(Debug, Error)]
pub enum DriveError {
    /// Caller supplied an unusable folder reference or file descriptor
    #[error("{0}")]
    InvalidInput(String),

    #[error("Missing GCP credentials")]
    MissingCredentials,

    #[error("Invalid Google Drive folder: Folder not found")]
    FolderNotFound,

    /// Non-2xx response or unreadable payload. Carries the raw upstream text.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to download file: {0}")]
    EmptyBody(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid service account credentials: {0}")]
    Credentials(String),
}

impl DriveError {
    /// Network failures and 5xx responses may succeed on retry; 4xx never do.
    pub fn is_transient(&self) -> bool {
        match self {
            DriveError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            DriveError::Upstream {
                status: Some(status),
                ..
            } => *status >= 500,
            _ => false,
        }
    }
}

impl From<DriveError> for AppError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::InvalidInput(msg) => AppError::BadRequest(msg),
            DriveError::MissingCredentials | DriveError::FolderNotFound => {
                AppError::BadRequest(err.to_string())
            }
            DriveError::Credentials(msg) => {
                AppError::BadRequest(format!("Invalid GCP credentials: {}", msg))
            }
            DriveError::Upstream { .. } | DriveError::EmptyBody(_) => {
                AppError::Upstream(err.to_string())
            }
            DriveError::Http(e) => AppError::Upstream(e.to_string()),
        }
    }
}

pub type DriveResult<T> = Result<T, DriveError>;
