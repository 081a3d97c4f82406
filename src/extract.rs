use std::{
    panic::{self, AssertUnwindSafe},
    path::Path,
};

/// Extensions read directly as UTF-8 text.
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv"];

/// Page-oriented document formats extracted page by page.
pub const PAGED_EXTENSIONS: &[&str] = &["pdf"];

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no text extractor for extension '{extension}'")]
    Unsupported { extension: String },

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("document contains no text")]
    Empty,
}

/// Extract plain text from the file at `path`.
///
/// `extension` is the lowercase extension without the dot. Plain-text
/// formats are read with invalid UTF-8 sequences replaced; PDFs are
/// extracted page by page and concatenated. An extractor producing only
/// whitespace is reported as [`ExtractionError::Empty`].
pub fn extract_text(
    path: &Path,
    extension: &str,
) -> Result<String, ExtractionError> {
    let text = if PLAIN_TEXT_EXTENSIONS.contains(&extension) {
        let bytes = std::fs::read(path)?;
        String::from_utf8_lossy(&bytes).into_owned()
    } else if PAGED_EXTENSIONS.contains(&extension) {
        extract_pdf(path)?
    } else {
        return Err(ExtractionError::Unsupported {
            extension: extension.to_string(),
        });
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty);
    }
    Ok(text)
}

fn extract_pdf(path: &Path) -> Result<String, ExtractionError> {
    // pdf-extract panics on some malformed inputs.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_by_pages(path)
    }))
    .map_err(|_| ExtractionError::Pdf("extractor panicked".to_string()))?
    .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    Ok(pages.join("\n"))
}
