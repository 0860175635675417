use tracing::{debug, warn};

use super::ExtractError;

/// Extracts PDF text page by page and joins the pages with page markers.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract can panic on malformed fonts and glyph tables.
    let pages = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    })) {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => return Err(ExtractError::Pdf(e.to_string())),
        Err(_) => {
            warn!("PDF extraction panicked, likely a malformed font");
            return Err(ExtractError::Pdf(
                "extraction panicked on malformed content".to_string(),
            ));
        }
    };

    debug!("Extracted {} PDF page(s)", pages.len());
    Ok(join_pages(&pages, "page"))
}

/// Joins page or slide texts in document order. Every unit after the first is
/// preceded by a `--- <label> N ---` line.
pub fn join_pages<S: AsRef<str>>(pages: &[S], label: &str) -> String {
    let mut output = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            output.push_str(&format!("\n\n--- {} {} ---\n\n", label, i + 1));
        }
        output.push_str(page.as_ref().trim());
    }
    output
}
