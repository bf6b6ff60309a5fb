//! Plain-text extraction from discovered files.
//!
//! Two strategies are supported:
//!
//! - `extract` parses the embedded text layer of PDF files page by page and
//!   reads every other file type as text.
//! - `direct` reads every file as raw (lossily decoded) text.
//!
//! Extraction never panics the run: parser errors and parser panics on
//! corrupted input are reported as [`ExtractionError`] values.

mod pdf;

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use pdf::{NO_TEXT_MARKER, extract_pdf_text};

/// Errors that can occur while extracting text from a file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The file yielded no text (e.g. a scanned PDF without a text layer).
    #[error("no extractable text")]
    NoText,

    /// The file could not be read.
    #[error("failed to read file: {0}")]
    Io(String),

    /// The PDF parser rejected the file.
    #[error("failed to parse PDF: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// How to obtain plain text from a source file (`pdf_method` in the config).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStrategy {
    /// Parse the PDF text layer.
    #[default]
    Extract,
    /// Treat the file as already-text.
    Direct,
}

/// Extracts plain text according to the configured strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor {
    strategy: ExtractionStrategy,
}

impl TextExtractor {
    pub const fn new(strategy: ExtractionStrategy) -> Self {
        Self { strategy }
    }

    /// Extracts the text of `path`.
    ///
    /// Blank output from any strategy is reported as [`ExtractionError::NoText`].
    pub fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let text = match self.strategy {
            ExtractionStrategy::Extract if is_pdf(path) => extract_pdf_text(path)?,
            ExtractionStrategy::Extract | ExtractionStrategy::Direct => read_text(path)?,
        };

        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }

        Ok(text)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn read_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Truncates `text` to at most `max_chars` characters. `0` means unlimited.
///
/// Returns `true` when the text was shortened.
pub fn truncate_chars(text: &mut String, max_chars: usize) -> bool {
    if max_chars == 0 {
        return false;
    }

    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            text.truncate(byte_index);
            true
        }
        None => false,
    }
}
