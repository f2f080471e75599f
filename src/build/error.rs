//! Build error taxonomy.
//!
//! Nothing here is retried or recovered. Partial output may remain on disk
//! after a failure, but a failed build is never reported as successful.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::BuildState;
use crate::icon::IconError;

/// A fatal pipeline error.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read `{}`", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to compile `{file}`: {message}")]
    Compile { file: String, message: String },

    // NOTE: No #[source] here - the failures list renders every icon itself
    #[error("{0}")]
    Fetch(FetchFailures),

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("template `{template}` uses icon `{icon}` which was never resolved")]
    UnresolvedIcon { template: String, icon: String },
}

impl BuildError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SourceRead {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Every icon that could not be fetched during one build.
#[derive(Debug, Default)]
pub struct FetchFailures(pub Vec<IconError>);

impl FetchFailures {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FetchFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.len();
        write!(
            f,
            "failed to fetch {count} icon{}",
            if count == 1 { "" } else { "s" }
        )?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

/// A build that stopped in `state`.
#[derive(Debug, Error)]
#[error("build failed during {state}")]
pub struct BuildFailure {
    pub state: BuildState,
    #[source]
    pub error: BuildError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::IconErrorKind;

    #[test]
    fn test_fetch_failures_display() {
        let failures = FetchFailures(vec![
            IconError::new("moon", IconErrorKind::Status(404)),
            IconError::new("sun", IconErrorKind::NotSvg),
        ]);
        let text = failures.to_string();
        assert!(text.starts_with("failed to fetch 2 icons"));
        assert!(text.contains("moon"));
        assert!(text.contains("sun"));
    }

    #[test]
    fn test_fetch_failures_len() {
        assert!(FetchFailures::default().is_empty());
        let failures = FetchFailures(vec![IconError::new("x", IconErrorKind::Offline)]);
        assert!(!failures.is_empty());
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn test_compile_error_names_file() {
        let err = BuildError::Compile {
            file: "app.js".into(),
            message: "Unexpected token".into(),
        };
        assert_eq!(err.to_string(), "failed to compile `app.js`: Unexpected token");
    }

    #[test]
    fn test_failure_reports_state() {
        let failure = BuildFailure {
            state: BuildState::CompileScripts,
            error: BuildError::Compile {
                file: "a.js".into(),
                message: "bad".into(),
            },
        };
        assert_eq!(failure.to_string(), "build failed during compile-scripts");
    }
}
