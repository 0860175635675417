//! Per-format text extraction.
//!
//! Every [`DocumentKind`] maps to exactly one strategy. Native Google formats
//! are exported by the Drive service into text or CSV, everything else is
//! downloaded as raw bytes and decoded here.

mod html;
mod office;
mod pdf;

use thiserror::Error;
use tracing::{debug, warn};

use crate::document::{DocumentKind, FileDescriptor};
use crate::drive::{DriveApi, DriveError};

pub use html::strip_html;
pub use office::{extract_docx, extract_pptx};
pub use pdf::{extract_pdf, join_pages};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("Presentation extraction failed: {0}")]
    Presentation(String),
}

/// Export format used when a native presentation cannot be exported as text.
pub const PDF_EXPORT_MIME: &str = "application/pdf";

/// How the raw bytes of a document are obtained from the drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRequest {
    Export(&'static str),
    Download,
}

pub fn content_request(kind: DocumentKind) -> Option<ContentRequest> {
    match kind {
        DocumentKind::NativeDocument | DocumentKind::NativePresentation => {
            Some(ContentRequest::Export("text/plain"))
        }
        DocumentKind::NativeSpreadsheet => Some(ContentRequest::Export("text/csv")),
        DocumentKind::Pdf
        | DocumentKind::WordDocument
        | DocumentKind::PresentationBinary
        | DocumentKind::PlainText
        | DocumentKind::Html => Some(ContentRequest::Download),
        DocumentKind::Unsupported => None,
    }
}

/// Fetches the bytes a document's extraction strategy needs.
/// Returns `None` for unsupported types.
pub async fn fetch_content(
    drive: &dyn DriveApi,
    descriptor: &FileDescriptor,
) -> Result<Option<Vec<u8>>, DriveError> {
    match content_request(descriptor.kind()) {
        Some(ContentRequest::Export(mime)) => {
            debug!("Exporting {} as {}", descriptor.name, mime);
            drive.export(&descriptor.id, mime).await.map(Some)
        }
        Some(ContentRequest::Download) => {
            debug!("Downloading {}", descriptor.name);
            drive.download(&descriptor.id).await.map(Some)
        }
        None => Ok(None),
    }
}

pub trait TextExtractor: Send + Sync {
    fn extract(&self, descriptor: &FileDescriptor, raw: &[u8]) -> Result<String, ExtractError>;
}

/// Dispatches on the descriptor's document kind.
#[derive(Debug, Default, Clone)]
pub struct DefaultTextExtractor;

impl DefaultTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for DefaultTextExtractor {
    fn extract(&self, descriptor: &FileDescriptor, raw: &[u8]) -> Result<String, ExtractError> {
        let kind = descriptor.kind();
        debug!(
            "Extracting {} ({:?}, {} bytes)",
            descriptor.name,
            kind,
            raw.len()
        );

        match kind {
            DocumentKind::NativeDocument
            | DocumentKind::NativeSpreadsheet
            | DocumentKind::NativePresentation
            | DocumentKind::PlainText => Ok(decode_text(raw)),
            DocumentKind::Pdf => extract_pdf(raw),
            DocumentKind::WordDocument => extract_docx(raw),
            DocumentKind::PresentationBinary => extract_pptx(raw),
            DocumentKind::Html => Ok(strip_html(&decode_text(raw))),
            DocumentKind::Unsupported => {
                warn!(
                    "Content extraction not supported for {} ({})",
                    descriptor.name, descriptor.mime_type
                );
                Ok(String::new())
            }
        }
    }
}

/// Decodes bytes as UTF-8, replacing invalid sequences, dropping a BOM and
/// normalizing line endings to `\n`.
pub fn decode_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    text.replace("\r\n", "\n").replace('\r', "\n")
}
