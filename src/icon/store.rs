//! Icon cache: `<build_dir>/icons/<name>.svg` on disk, memoized per build.
//!
//! A cached file is never refreshed. Its presence alone means "do not
//! fetch", whatever the remote repository serves today.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;

use super::scan::IconRequest;
use super::source::{IconError, IconErrorKind, IconSource, looks_like_svg, validate_name};
use crate::build::{BuildError, FetchFailures};
use crate::config::FetchErrorPolicy;
use crate::debug;

/// Where one icon's markup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Already in memory or on disk.
    Cached,
    /// Downloaded and written to the cache.
    Fetched,
}

/// Outcome of a fetch phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub fetched: usize,
    pub cached: usize,
}

impl FetchSummary {
    pub fn total(&self) -> usize {
        self.fetched + self.cached
    }
}

pub struct IconStore {
    dir: PathBuf,
    memo: DashMap<String, Arc<str>>,
}

impl IconStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            memo: DashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.svg"))
    }

    /// Markup resolved earlier in this build.
    pub fn get(&self, name: &str) -> Option<Arc<str>> {
        self.memo.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Resolved icon names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.memo.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve one icon: memo, then disk, then the source.
    pub fn resolve(
        &self,
        request: &IconRequest,
        source: &dyn IconSource,
    ) -> Result<Resolution, IconError> {
        let name = request.name.as_str();
        let fail = |kind| IconError::new(name, kind);

        validate_name(name).map_err(fail)?;
        validate_name(&request.remote).map_err(fail)?;

        if self.memo.contains_key(name) {
            return Ok(Resolution::Cached);
        }

        let path = self.cache_path(name);
        if path.is_file() {
            let markup =
                std::fs::read_to_string(&path).map_err(|e| fail(IconErrorKind::Io(e.to_string())))?;
            debug!("icon/check"; "{name} (cached)");
            self.memo.insert(name.to_string(), markup.into());
            return Ok(Resolution::Cached);
        }

        debug!("icon/check"; "{name} -> fetching `{}`", request.remote);
        let markup = source.fetch(&request.remote).map_err(fail)?;
        if !looks_like_svg(&markup) {
            return Err(fail(IconErrorKind::NotSvg));
        }

        std::fs::write(&path, &markup).map_err(|e| fail(IconErrorKind::Io(e.to_string())))?;
        debug!("icon/save"; "{}", path.display());
        self.memo.insert(name.to_string(), markup.into());
        Ok(Resolution::Fetched)
    }

    /// Resolve every request concurrently.
    ///
    /// With [`FetchErrorPolicy::Abort`] the first failure stops the phase;
    /// with [`FetchErrorPolicy::Collect`] every icon is tried and all
    /// failures are reported together.
    pub fn resolve_all(
        &self,
        requests: &[IconRequest],
        source: &dyn IconSource,
        policy: FetchErrorPolicy,
    ) -> Result<FetchSummary, BuildError> {
        let outcomes: Vec<Resolution> = match policy {
            FetchErrorPolicy::Abort => requests
                .par_iter()
                .map(|request| self.resolve(request, source))
                .collect::<Result<_, _>>()
                .map_err(|e| BuildError::Fetch(FetchFailures(vec![e])))?,
            FetchErrorPolicy::Collect => {
                let (ok, failed): (Vec<_>, Vec<_>) = requests
                    .par_iter()
                    .map(|request| self.resolve(request, source))
                    .partition_map(|result| match result {
                        Ok(resolution) => rayon::iter::Either::Left(resolution),
                        Err(error) => rayon::iter::Either::Right(error),
                    });
                let failures = FetchFailures(failed);
                if !failures.is_empty() {
                    return Err(BuildError::Fetch(failures));
                }
                ok
            }
        };

        let fetched = outcomes.iter().filter(|r| **r == Resolution::Fetched).count();
        Ok(FetchSummary {
            fetched,
            cached: outcomes.len() - fetched,
        })
    }
}
