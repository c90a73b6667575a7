use std::fs;
use std::path::{Path, PathBuf};

/// A PDF handed over by the upload control, consumed once by the pipeline.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unsupported file type: .{0}")]
    Unsupported(String),
    #[error("File is not a PDF (no %PDF header)")]
    NotAPdf,
    #[error("PDF parse error: {0}")]
    Parse(String),
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a `.pdf` file from disk, keeping its file name for display.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "pdf" {
            return Err(ExtractError::Unsupported(ext));
        }

        let bytes = fs::read(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self { filename, bytes })
    }
}

/// Extract the text of every page, in page order. A page without a text
/// layer yields an empty string.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    if !looks_like_pdf(bytes) {
        return Err(ExtractError::NotAPdf);
    }
    pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Parse(e.to_string()))
}

/// Extract the whole document as one string, pages joined without separator.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = extract_pages(bytes)?;
    tracing::debug!(pages = pages.len(), "extracted PDF text");
    Ok(pages.concat())
}

/// Scanned or image-only PDFs come back empty or as bare whitespace.
pub fn has_extractable_text(text: &str) -> bool {
    !text.trim().is_empty()
}

// The header may be preceded by junk; readers accept it within the first 1 KiB.
fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}
