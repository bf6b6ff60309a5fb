//! Serialization of generated text into output files.
//!
//! The destination of each output mirrors the input's path relative to the
//! input root, under the task's output directory, with the extension of the
//! configured format. Files are written through [`atomic_write`] so an
//! interrupted or failed write never leaves a partial file behind.

mod docx;
mod tex;

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fs::atomic_write;

pub use docx::{DocumentStyle, render_docx};
pub use tex::{escape_latex, render_tex};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build DOCX package: {0}")]
    Docx(#[from] zip::result::ZipError),
}

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Docx,
    Tex,
    Txt,
    Md,
}

impl OutputFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Tex => "tex",
            Self::Txt => "txt",
            Self::Md => "md",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `{output_root}/{relative dir}/{stem}.{extension}`
pub fn mirrored_path(output_root: &Path, relative: &Path, extension: &str) -> PathBuf {
    output_root.join(relative).with_extension(extension)
}

/// Writes generated text in one configured format.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    format: OutputFormat,
    style: DocumentStyle,
}

impl OutputWriter {
    pub const fn new(format: OutputFormat, style: DocumentStyle) -> Self {
        Self { format, style }
    }

    /// Destination of the output for an input at `relative` under `output_root`.
    pub fn destination(&self, output_root: &Path, relative: &Path) -> PathBuf {
        mirrored_path(output_root, relative, self.format.extension())
    }

    /// Serializes `text` to bytes. `title` is only used by DOCX.
    pub fn render(&self, text: &str, title: &str) -> Result<Vec<u8>, WriteError> {
        Ok(match self.format {
            OutputFormat::Txt | OutputFormat::Md => text.as_bytes().to_vec(),
            OutputFormat::Tex => render_tex(text).into_bytes(),
            OutputFormat::Docx => render_docx(text, title, &self.style)?,
        })
    }

    /// Renders and writes `text` to `destination`, creating parent directories.
    pub fn write(&self, text: &str, destination: &Path, title: &str) -> Result<(), WriteError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let bytes = self.render(text, title)?;

        atomic_write(destination, &bytes).map_err(|source| WriteError::Write {
            path: destination.to_path_buf(),
            source,
        })
    }
}
