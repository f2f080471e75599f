//! Source tree walker that mirrors directories into the build root.
//!
//! Every regular file is handed to a visitor together with the destination
//! path it should be written to. Traversal is depth-first in directory
//! listing order: a subtree is finished, visitor calls included, before the
//! next sibling entry is looked at.

use std::fs;
use std::path::{Path, PathBuf};

use crate::build::BuildError;
use crate::utils::fs::{IGNORED_FILES, ensure_dir};

/// How source nesting maps onto the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// `src/a/b.css` -> `dest/a/b.css`; directories are recreated.
    Mirrored,
    /// `src/a/b.css` -> `dest/b.css`; only `dest` itself is created.
    Flattened,
}

/// A file found during the walk.
#[derive(Debug)]
pub struct WalkEntry<'a> {
    /// Bare file name.
    pub name: &'a str,
    /// Absolute source path.
    pub source: &'a Path,
    /// Where the transformed file belongs.
    pub dest: PathBuf,
    /// Directory of the file relative to the source root.
    pub rel_dir: &'a Path,
}

impl WalkEntry<'_> {
    /// `rel_dir` as a `/`-joined URL fragment with trailing slash, or `""`.
    pub fn url_dir(&self) -> String {
        let mut out = String::new();
        for part in self.rel_dir.components() {
            out.push_str(&part.as_os_str().to_string_lossy());
            out.push('/');
        }
        out
    }
}

/// Walk `source_root`, creating `dest_root` (and, when mirrored, every
/// sub-directory under it) and calling `visit` for each file.
pub fn walk_tree<F>(
    source_root: &Path,
    dest_root: &Path,
    mode: WalkMode,
    visit: &mut F,
) -> Result<(), BuildError>
where
    F: FnMut(WalkEntry<'_>) -> Result<(), BuildError>,
{
    ensure_dir(dest_root)?;
    walk_dir(source_root, Path::new(""), dest_root, mode, visit)
}

fn walk_dir<F>(
    dir: &Path,
    rel_dir: &Path,
    dest_root: &Path,
    mode: WalkMode,
    visit: &mut F,
) -> Result<(), BuildError>
where
    F: FnMut(WalkEntry<'_>) -> Result<(), BuildError>,
{
    for entry in fs::read_dir(dir).map_err(|e| BuildError::read(dir, e))? {
        let entry = entry.map_err(|e| BuildError::read(dir, e))?;
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if path.is_dir() {
            let rel = rel_dir.join(&file_name);
            if mode == WalkMode::Mirrored {
                ensure_dir(&dest_root.join(&rel))?;
            }
            crate::debug!("walk"; "sub {}", rel.display());
            walk_dir(&path, &rel, dest_root, mode, visit)?;
            continue;
        }

        if IGNORED_FILES.contains(&&*name) {
            continue;
        }

        let dest = match mode {
            WalkMode::Mirrored => dest_root.join(rel_dir).join(&file_name),
            WalkMode::Flattened => dest_root.join(&file_name),
        };

        visit(WalkEntry {
            name: &name,
            source: &path,
            dest,
            rel_dir,
        })?;
    }

    Ok(())
}
