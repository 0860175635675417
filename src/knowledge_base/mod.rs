//! Assembles processed documents into a single Markdown knowledge base.

mod markdown;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::document::{DocumentKind, ExtractedDocument, FileDescriptor};
use crate::drive::DriveApi;
use crate::extract::{extract_pdf, fetch_content, TextExtractor, PDF_EXPORT_MIME};
use crate::external::Summarizer;

pub use markdown::{heading_text, render, Slugger};

/// Rendered output: a title plus sections in walk order.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    pub title: String,
    pub documents: Vec<ExtractedDocument>,
}

impl KnowledgeBase {
    pub fn render(&self) -> String {
        render(&self.title, &self.documents)
    }

    /// Writes the rendered Markdown to a temporary file beside `path` and
    /// renames it into place, replacing any existing file.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;

        let mut file = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
        file.write_all(self.render().as_bytes())
            .context("Failed to write knowledge base")?;
        file.flush().context("Failed to flush knowledge base")?;
        file.persist(path)
            .with_context(|| format!("Failed to move knowledge base into {:?}", path))?;

        info!("Knowledge base written to {:?}", path);
        Ok(())
    }
}

pub struct KnowledgeBaseBuilder {
    drive: Arc<dyn DriveApi>,
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
    max_concurrent: usize,
    title: String,
}

impl KnowledgeBaseBuilder {
    pub fn new(
        drive: Arc<dyn DriveApi>,
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            drive,
            extractor,
            summarizer,
            max_concurrent: 4,
            title: "Google Drive Knowledge Base".to_string(),
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Processes every descriptor, at most `max_concurrent` at a time.
    /// Sections come back in the order the descriptors were given.
    pub async fn build(&self, descriptors: Vec<FileDescriptor>) -> KnowledgeBase {
        let total = descriptors.len();
        info!(
            "Processing {} documents ({} at a time)",
            total, self.max_concurrent
        );

        let documents: Vec<ExtractedDocument> = stream::iter(descriptors.into_iter().enumerate())
            .map(|(i, descriptor)| async move {
                let doc = self.process_document(descriptor).await;
                info!("Processed {}/{}: {}", i + 1, total, doc.descriptor.name);
                doc
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let summarized = documents.iter().filter(|d| d.summary.is_some()).count();
        info!(
            "Processed {} documents, {} with summaries",
            documents.len(),
            summarized
        );

        KnowledgeBase {
            title: self.title.clone(),
            documents,
        }
    }

    /// Extraction and summarization failures degrade the document instead of
    /// dropping it.
    pub async fn process_document(&self, descriptor: FileDescriptor) -> ExtractedDocument {
        let text = match self.extract_text(&descriptor).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to extract {} ({}): {:#}", descriptor.name, descriptor.id, e);
                String::new()
            }
        };

        let (summary, key_concepts) = if text.trim().is_empty() {
            (None, Vec::new())
        } else {
            match self.summarizer.summarize(&text).await {
                Ok(summary) => (Some(summary.summary), summary.key_concepts),
                Err(e) => {
                    warn!("Failed to summarize {} ({}): {}", descriptor.name, descriptor.id, e);
                    (None, Vec::new())
                }
            }
        };

        ExtractedDocument {
            descriptor,
            text,
            summary,
            key_concepts,
        }
    }

    async fn extract_text(&self, descriptor: &FileDescriptor) -> Result<String> {
        match fetch_content(self.drive.as_ref(), descriptor).await {
            Ok(raw) => Ok(self.extractor.extract(descriptor, &raw.unwrap_or_default())?),
            Err(e) if descriptor.kind() == DocumentKind::NativePresentation => {
                warn!(
                    "Text export of {} failed ({}), exporting as PDF instead",
                    descriptor.name, e
                );
                let pdf = self
                    .drive
                    .export(&descriptor.id, PDF_EXPORT_MIME)
                    .await
                    .context("Failed to export presentation as PDF")?;
                Ok(extract_pdf(&pdf)?)
            }
            Err(e) => Err(e).context("Failed to fetch content"),
        }
    }
}
