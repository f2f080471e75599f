//! Filesystem helpers shared by the pipeline stages.
//!
//! All helpers map I/O failures onto [`BuildError`] so callers can use `?`
//! and still report which side of the pipeline (read or write) failed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::build::BuildError;

pub const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively.
///
/// Counts the same files [`walk_tree`](crate::asset::walk_tree) visits:
/// dotfiles included, [`IGNORED_FILES`] excluded.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .skip_hidden(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path())
        .collect()
}

/// Create a directory if it does not exist yet.
///
/// Check-then-create; losing a race to another creator is not an error.
pub fn ensure_dir(path: &Path) -> Result<(), BuildError> {
    if path.is_dir() {
        return Ok(());
    }
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(BuildError::write(path, e)),
    }
}

pub fn read_text(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).map_err(|e| BuildError::read(path, e))
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, BuildError> {
    fs::read(path).map_err(|e| BuildError::read(path, e))
}

pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), BuildError> {
    fs::write(path, contents).map_err(|e| BuildError::write(path, e))
}

/// Remove a directory tree; a missing directory is already clear.
pub fn remove_dir(path: &Path) -> Result<bool, BuildError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BuildError::write(path, e)),
    }
}

/// Copy a directory tree byte-for-byte.
///
/// Returns the number of files copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize, BuildError> {
    ensure_dir(dst)?;

    let mut count = 0;
    for entry in fs::read_dir(src).map_err(|e| BuildError::read(src, e))? {
        let entry = entry.map_err(|e| BuildError::read(src, e))?;
        let src_path = entry.path();
        let dest_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            count += copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path).map_err(|e| BuildError::write(&dest_path, e))?;
            count += 1;
        }
    }

    Ok(count)
}
