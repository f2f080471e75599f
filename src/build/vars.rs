//! Build-time facts substituted by `{{ var "name" }}`.

use std::path::Path;

use crate::utils::date::DateTimeUtc;
use crate::utils::git::head_revision;

/// Revision reported when none can be determined.
pub const UNKNOWN_REVISION: &str = "unknown";

const SHORT_REVISION_LEN: usize = 7;

/// Computed once at build start; never changes during the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildVariables {
    /// RFC 3339 UTC timestamp.
    pub build_time: String,
    pub commit: String,
    pub commit_short: String,
}

impl BuildVariables {
    pub fn new(build_time: DateTimeUtc, commit: &str) -> Self {
        let commit_short = commit.chars().take(SHORT_REVISION_LEN).collect();
        Self {
            build_time: build_time.to_rfc3339(),
            commit: commit.to_string(),
            commit_short,
        }
    }

    /// Now, with `revision` or else the `HEAD` of the repository around
    /// `root`.
    pub fn detect(root: &Path, revision: Option<&str>) -> Self {
        let commit = revision
            .map(str::to_string)
            .or_else(|| head_revision(root))
            .unwrap_or_else(|| UNKNOWN_REVISION.to_string());
        Self::new(DateTimeUtc::now(), &commit)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            "build_time" => Some(&self.build_time),
            "commit" => Some(&self.commit),
            "commit_short" => Some(&self.commit_short),
            _ => None,
        }
    }
}
