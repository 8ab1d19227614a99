//! External drive file descriptors and the classification rules applied to them

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Extensions accepted when listing a drive folder
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv", "doc", "docx", "pdf", "md", "txt"];

/// MIME types offered by the picker, with their display label
pub const PICKER_MIME_TYPES: &[(&str, &str)] = &[
    ("application/pdf", "PDF"),
    ("application/msword", "Word"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "Word",
    ),
    ("text/plain", "TXT"),
    ("text/csv", "CSV"),
    ("text/markdown", "Markdown"),
    ("image/png", "Image"),
    ("image/jpeg", "Image"),
    ("image/jpg", "Image"),
];

/// Label reported when neither the size nor the file type can be determined
pub const UNKNOWN: &str = "Unknown";

/// File descriptor relayed from the client; never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFileDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_access_token: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ExternalFileDescriptor {
    /// Bearer capability for the authenticated download path, if one was attached.
    pub fn access_capability(&self) -> Option<&str> {
        self.google_access_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    pub fn source_link(&self) -> Option<&str> {
        self.web_view_link.as_deref().filter(|link| !link.is_empty())
    }
}

/// Advisory file classification shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FileKind {
    #[serde(rename = "PDF")]
    Pdf,
    Word,
    #[serde(rename = "TXT")]
    Txt,
    #[serde(rename = "CSV")]
    Csv,
    Markdown,
    Image,
    Unknown,
}

impl FileKind {
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Word => "Word",
            FileKind::Txt => "TXT",
            FileKind::Csv => "CSV",
            FileKind::Markdown => "Markdown",
            FileKind::Image => "Image",
            FileKind::Unknown => UNKNOWN,
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(FileKind::Pdf),
            "doc" | "docx" => Some(FileKind::Word),
            "txt" => Some(FileKind::Txt),
            "csv" => Some(FileKind::Csv),
            "md" => Some(FileKind::Markdown),
            "png" | "jpg" | "jpeg" => Some(FileKind::Image),
            _ => None,
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(FileKind::Pdf),
            "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(FileKind::Word)
            }
            "text/plain" => Some(FileKind::Txt),
            "text/csv" => Some(FileKind::Csv),
            "text/markdown" => Some(FileKind::Markdown),
            "image/png" | "image/jpeg" => Some(FileKind::Image),
            _ => None,
        }
    }
}

/// Lowercased text after the last `.` of a file name. A name without a dot is its own extension.
pub fn file_extension(name: &str) -> String {
    name.rsplit('.').next().unwrap_or_default().to_lowercase()
}

/// Classify by extension first, then by MIME type.
pub fn classify(name: &str, mime_type: &str) -> FileKind {
    FileKind::from_extension(&file_extension(name))
        .or_else(|| FileKind::from_mime(mime_type))
        .unwrap_or(FileKind::Unknown)
}

pub fn is_allowed_extension(name: &str) -> bool {
    let ext = file_extension(name);
    ALLOWED_EXTENSIONS.contains(&ext.as_str())
}

/// Label for a picker MIME type, `None` when the picker does not offer it.
pub fn mime_label(mime_type: &str) -> Option<&'static str> {
    PICKER_MIME_TYPES
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, label)| *label)
}

/// Render a byte count the way listings show it: `"2.00 KB"`, or `"Unknown"`.
pub fn format_size_kb(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) => format!("{:.2} KB", bytes as f64 / 1024.0),
        None => UNKNOWN.to_string(),
    }
}

/// Same as [`format_size_kb`] for sizes the provider reports as decimal strings.
pub fn format_size_text(size: Option<&str>) -> String {
    format_size_kb(size.and_then(|s| s.trim().parse::<u64>().ok()))
}

/// Byte size recovered from a KB string: the integer part times 1024.
///
/// `"2.00 KB"` gives 2048, `"0.50 KB"` gives 0 and `"Unknown"` gives `None`.
pub fn parse_size_kb(size: &str) -> Option<i64> {
    let digits: String = size
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok()?.checked_mul(1024)
}
