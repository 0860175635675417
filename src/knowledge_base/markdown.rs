use std::collections::HashSet;
use std::fmt::Write;

use crate::document::{format_timestamp, ExtractedDocument};

const DESCRIPTION: &str =
    "This file contains text extracted from documents in Google Drive, along with AI-generated summaries.";
const METADATA_HEADING: &str = "Metadata";
const SUMMARY_HEADING: &str = "Summary & Key Concepts";
const CONTENT_HEADING: &str = "Full Content";
const TOC_HEADING: &str = "Table of Contents";

/// Generates GitHub-style heading anchors, suffixing repeats with `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashSet<String>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug(&mut self, heading: &str) -> String {
        let mut base: String = heading
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_' || *c == ' ')
            .map(|c| if c == ' ' { '-' } else { c })
            .collect();
        if base.is_empty() {
            base = "section".to_string();
        }

        let mut candidate = base.clone();
        let mut n = 0;
        while self.seen.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{}", base, n);
        }
        self.seen.insert(candidate.clone());
        candidate
    }
}

/// Heading text as it appears in the output: single line, trimmed.
pub fn heading_text(name: &str) -> String {
    let flat = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        "Untitled Document".to_string()
    } else {
        flat
    }
}

/// A fence of backticks longer than any backtick run inside `text`.
fn fence_for(text: &str) -> String {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Backslash-escapes every character that could turn plain text into
/// Markdown structure: emphasis, links, inline HTML, entities, heading markers.
fn escape_inline(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '#' | '<' | '>' | '&' | '*' | '_' | '`' | '[' | ']' | '!' | '|' | '~'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Collapses model output onto one escaped line so it can never open a
/// heading, list or block of its own.
fn inline_paragraph(text: &str) -> String {
    escape_inline(&text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// YAML double-quoted scalar. JSON string syntax is a subset of it.
fn yaml_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Anchors for every section heading, computed over the full heading sequence
/// in document order so repeats resolve the same way a renderer does.
fn section_anchors(title: &str, documents: &[ExtractedDocument]) -> Vec<String> {
    let mut slugger = Slugger::new();
    slugger.slug(title);
    slugger.slug(TOC_HEADING);

    documents
        .iter()
        .map(|doc| {
            let anchor = slugger.slug(&heading_text(&doc.descriptor.name));
            slugger.slug(METADATA_HEADING);
            if doc.summary.is_some() {
                slugger.slug(SUMMARY_HEADING);
            }
            slugger.slug(CONTENT_HEADING);
            anchor
        })
        .collect()
}

pub fn render(title: &str, documents: &[ExtractedDocument]) -> String {
    let title = heading_text(title);
    let anchors = section_anchors(&title, documents);
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", escape_inline(&title));
    let _ = writeln!(out, "*{}*\n", DESCRIPTION);

    let _ = writeln!(out, "## {}\n", TOC_HEADING);
    for (i, (doc, anchor)) in documents.iter().zip(&anchors).enumerate() {
        let _ = writeln!(
            out,
            "{}. [{}](#{})",
            i + 1,
            escape_inline(&heading_text(&doc.descriptor.name)),
            anchor
        );
    }
    out.push_str("\n---\n\n");

    for doc in documents {
        render_section(&mut out, doc);
        out.push_str("\n---\n\n");
    }

    out
}

fn render_section(out: &mut String, doc: &ExtractedDocument) {
    let descriptor = &doc.descriptor;
    let name = heading_text(&descriptor.name);

    let _ = writeln!(out, "## {}\n", escape_inline(&name));

    let _ = writeln!(out, "### {}\n", METADATA_HEADING);
    let mut metadata = String::new();
    let _ = writeln!(metadata, "title: {}", yaml_string(&name));
    let _ = writeln!(metadata, "type: {}", yaml_string(&descriptor.mime_type));
    let _ = writeln!(
        metadata,
        "created: {}",
        format_timestamp(descriptor.created_time.as_ref())
    );
    let _ = writeln!(
        metadata,
        "modified: {}",
        format_timestamp(descriptor.modified_time.as_ref())
    );
    let _ = writeln!(metadata, "path: {}", yaml_string(&descriptor.display_path()));
    let _ = writeln!(metadata, "id: {}", yaml_string(&descriptor.id));
    if let Some(url) = &descriptor.web_view_link {
        let _ = writeln!(metadata, "url: {}", yaml_string(url));
    }
    let fence = fence_for(&metadata);
    let _ = writeln!(out, "{}yaml\n{}{}\n", fence, metadata, fence);

    if let Some(summary) = &doc.summary {
        let _ = writeln!(out, "### {}\n", SUMMARY_HEADING);
        let _ = writeln!(out, "{}\n", inline_paragraph(summary));
        if !doc.key_concepts.is_empty() {
            out.push_str("**Key Concepts:**\n\n");
            for concept in &doc.key_concepts {
                let _ = writeln!(out, "- {}", inline_paragraph(concept));
            }
            out.push('\n');
        }
    }

    let _ = writeln!(out, "### {}\n", CONTENT_HEADING);
    if doc.text.trim().is_empty() {
        out.push_str("*No content available*\n");
    } else {
        let fence = fence_for(&doc.text);
        let _ = writeln!(out, "{}\n{}\n{}", fence, doc.text.trim_end(), fence);
    }
}
