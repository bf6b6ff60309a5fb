//! File system utilities.

use std::fs;
use std::io;
use std::path::Path;

/// Writes content to a file atomically using a temp file and rename.
///
/// The temp file is created next to the target so the rename stays on one
/// filesystem. On failure the temp file is removed and the target is left
/// untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let temp_path = parent.join(format!(".{file_name}.tmp"));

    let result = fs::write(&temp_path, content).and_then(|()| fs::rename(&temp_path, path));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}
