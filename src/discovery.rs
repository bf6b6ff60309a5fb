//! Recursive discovery of input files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("input directory does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("input path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// A file found under the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Path relative to the input root, used to mirror the output layout.
    pub relative: PathBuf,
}

impl DiscoveredFile {
    /// File name without its extension, used as the document title.
    pub fn stem(&self) -> String {
        self.relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Lists files under a root directory whose extension is in an allow-list.
#[derive(Debug, Clone)]
pub struct FileDiscoverer {
    root: PathBuf,
    extensions: BTreeSet<String>,
}

impl FileDiscoverer {
    /// Creates a discoverer for `root`.
    ///
    /// Extensions are matched case-insensitively; a leading dot is ignored.
    pub fn new<I, S>(root: &Path, extensions: I) -> Result<Self, DiscoveryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = root
            .canonicalize()
            .map_err(|_| DiscoveryError::MissingRoot(root.to_path_buf()))?;

        if !root.is_dir() {
            return Err(DiscoveryError::NotADirectory(root));
        }

        let extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();

        Ok(Self { root, extensions })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the tree lazily in lexicographic order per directory level.
    ///
    /// Each call starts a fresh walk.
    pub fn iter(&self) -> impl Iterator<Item = DiscoveredFile> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("Error walking entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.matches(entry.path()))
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&self.root).ok()?.to_path_buf();
                Some(DiscoveredFile {
                    path: entry.into_path(),
                    relative,
                })
            })
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }
}

/// Lowercases an extension and strips any leading dots.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}
