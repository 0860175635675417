use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
pub const SHORTCUT_MIME: &str = "application/vnd.google-apps.shortcut";

/// Metadata for one drive file, produced by the folder walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Ancestor folder names, starting with the walk root.
    pub path: Vec<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    pub web_view_link: Option<String>,
}

impl FileDescriptor {
    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_mime(&self.mime_type)
    }

    /// Full slash-separated location including the file name.
    pub fn display_path(&self) -> String {
        let mut parts: Vec<&str> = self.path.iter().map(String::as_str).collect();
        parts.push(&self.name);
        format!("/{}", parts.join("/"))
    }
}

pub fn format_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Closed set of document types, each with its own extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    NativeDocument,
    NativeSpreadsheet,
    NativePresentation,
    Pdf,
    WordDocument,
    PresentationBinary,
    PlainText,
    Html,
    Unsupported,
}

impl DocumentKind {
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type {
            "application/vnd.google-apps.document" => Self::NativeDocument,
            "application/vnd.google-apps.spreadsheet" => Self::NativeSpreadsheet,
            "application/vnd.google-apps.presentation" => Self::NativePresentation,
            "application/pdf" => Self::Pdf,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Self::WordDocument
            }
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Self::PresentationBinary
            }
            "text/plain" | "text/markdown" | "text/csv" => Self::PlainText,
            "text/html" => Self::Html,
            _ => Self::Unsupported,
        }
    }
}

/// One processed document, ready to be rendered as a section.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub descriptor: FileDescriptor,
    pub text: String,
    pub summary: Option<String>,
    pub key_concepts: Vec<String>,
}
