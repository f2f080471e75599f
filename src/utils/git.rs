//! Revision lookup for build stamps.

use std::path::Path;

/// Full hex id of `HEAD` for the repository containing `root`.
///
/// Returns `None` outside a repository or on an unborn branch.
pub fn head_revision(root: &Path) -> Option<String> {
    let repo = gix::discover(root).ok()?;
    let id = repo.head_id().ok()?;
    Some(id.to_hex().to_string())
}
