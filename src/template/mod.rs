//! Template output: seed the template build directory, then patch every
//! text template with its expanded macros.
//!
//! The build directory is a copy-then-patch construct. It is mirrored from
//! the sources once, when absent, and never re-mirrored afterwards: files
//! removed from the sources stay in the build directory.

mod expand;
pub mod macros;

pub use expand::{Expander, IconLookup};

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::asset::{WalkMode, walk_tree};
use crate::build::BuildError;
use crate::logger::ProgressLine;
use crate::utils::fs::{copy_dir_recursive, read_bytes, write_file};
use crate::{debug, log};

/// Progress counter label for the expansion pass.
pub const PROGRESS_LABEL: &str = "templates";

/// Mirror `templates_dir` into `build_dir` unless it already exists.
///
/// Returns the number of files copied, `None` when the directory was
/// already seeded.
pub fn seed_templates(templates_dir: &Path, build_dir: &Path) -> Result<Option<usize>, BuildError> {
    if build_dir.exists() {
        debug!("templates"; "{} already seeded", build_dir.display());
        return Ok(None);
    }
    let copied = copy_dir_recursive(templates_dir, build_dir)?;
    log!("templates"; "seeded {} ({} files)", build_dir.display(), copied);
    Ok(Some(copied))
}

/// Expand every UTF-8 template into its mirrored place under `build_dir`.
///
/// All templates are expanded in memory before any is written, so an
/// unresolved icon leaves the previous output untouched. Binary files keep
/// their seeded copy. Returns the number of templates written.
pub fn expand_templates(
    templates_dir: &Path,
    build_dir: &Path,
    expander: &Expander<'_>,
    progress: Option<&ProgressLine>,
) -> Result<usize, BuildError> {
    let mut files: Vec<(PathBuf, PathBuf, String)> = Vec::new();
    walk_tree(templates_dir, build_dir, WalkMode::Mirrored, &mut |entry| {
        let rel = entry.rel_dir.join(entry.name).to_string_lossy().into_owned();
        files.push((entry.source.to_path_buf(), entry.dest, rel));
        Ok(())
    })?;

    let expanded: Vec<(&PathBuf, String)> = files
        .par_iter()
        .map(|(source, dest, rel)| {
            let bytes = read_bytes(source)?;
            let result = match String::from_utf8(bytes) {
                Ok(text) => {
                    debug!("templates"; "{rel}");
                    Some((dest, expander.expand(rel, &text)?))
                }
                Err(_) => {
                    debug!("templates"; "{rel} (binary, kept)");
                    None
                }
            };
            if let Some(p) = progress {
                p.inc(PROGRESS_LABEL);
            }
            Ok(result)
        })
        .filter_map(Result::transpose)
        .collect::<Result<_, BuildError>>()?;

    for (dest, text) in &expanded {
        write_file(dest, text)?;
    }
    Ok(expanded.len())
}
