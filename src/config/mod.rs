//! Build configuration (`builder.toml`).
//!
//! # Example
//!
//! ```toml
//! css_dir = "static/css"
//! js_dir = "static/js"
//! templates_dir = "templates"
//! build_dir = "static/build"
//! templates_build_dir = "templates_build"
//! clear_dirs = ["css", "js"]
//! public_path = "/static/build"
//!
//! [icons]
//! "brand" = "github"   # {{ icon "brand" }} inlines the remote `github` icon
//!
//! [js]
//! mangle = false
//! ```
//!
//! A `.json` config path is parsed as JSON with the same keys.

mod error;
mod section;

pub use error::ConfigError;
pub use section::{CssOptions, FetchErrorPolicy, JsOptions};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::log;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "builder.toml";

/// Raw SVG base URL of the Lucide icon set.
pub const LUCIDE_ENDPOINT: &str =
    "https://raw.githubusercontent.com/lucide-icons/lucide/refs/heads/main/icons/";

/// Placeholder substituted with the text key in `text_lookup`.
pub const TEXT_KEY_PLACEHOLDER: &str = "{key}";

/// Everything one build needs. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Project root - parent of the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Stylesheet sources.
    pub css_dir: PathBuf,
    /// Script sources.
    pub js_dir: PathBuf,
    /// Template sources.
    pub templates_dir: PathBuf,
    /// Build root for `css/`, `js/` and `icons/`.
    pub build_dir: PathBuf,
    /// Expanded templates land here.
    pub templates_build_dir: PathBuf,
    /// Sub-directories of `build_dir` removed before building.
    pub clear_dirs: Vec<PathBuf>,

    /// Icon repository base URL; `<name>.svg` is appended.
    pub icons_endpoint: String,
    /// Global timeout for one icon request.
    pub fetch_timeout_secs: u64,
    pub on_fetch_error: FetchErrorPolicy,

    /// URL prefix the build root is served under.
    pub public_path: String,
    /// Replacement for `{{ text "key" }}`; `{key}` receives the key.
    pub text_lookup: String,
    /// Content-hash output names.
    pub hash: bool,

    /// Icons fetched on every build: local name -> remote name.
    pub icons: BTreeMap<String, String>,
    pub css: CssOptions,
    pub js: JsOptions,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            css_dir: "static/css".into(),
            js_dir: "static/js".into(),
            templates_dir: "templates".into(),
            build_dir: "static/build".into(),
            templates_build_dir: "templates_build".into(),
            clear_dirs: vec!["css".into(), "js".into()],
            icons_endpoint: LUCIDE_ENDPOINT.into(),
            fetch_timeout_secs: 30,
            on_fetch_error: FetchErrorPolicy::default(),
            public_path: "/static/build".into(),
            text_lookup: "{{ lang(\"{key}\") }}".into(),
            hash: true,
            icons: BTreeMap::new(),
            css: CssOptions::default(),
            js: JsOptions::default(),
        }
    }
}

impl BuildOptions {
    /// Load, resolve against the config file's directory, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let (options, ignored) = Self::parse_with_ignored(&content, is_json)?;

        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());
            log!("warn"; "unknown fields in {}: {}", display_path, ignored.join(", "));
        }

        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let root = root.canonicalize().unwrap_or(root);

        let options = options.resolve(&root);
        options.validate()?;
        Ok(options)
    }

    /// Parse configuration from TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(Self::parse_with_ignored(content, false)?.0)
    }

    /// Parse content, collecting any unknown fields.
    fn parse_with_ignored(content: &str, json: bool) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let mut on_ignored = |path: serde_ignored::Path| ignored.push(path.to_string());

        let options = if json {
            let mut deserializer = serde_json::Deserializer::from_str(content);
            serde_ignored::deserialize(&mut deserializer, &mut on_ignored)?
        } else {
            let deserializer = toml::Deserializer::new(content);
            serde_ignored::deserialize(deserializer, &mut on_ignored)?
        };
        Ok((options, ignored))
    }

    /// Make every directory absolute under `root`.
    pub fn resolve(mut self, root: &Path) -> Self {
        for dir in [
            &mut self.css_dir,
            &mut self.js_dir,
            &mut self.templates_dir,
            &mut self.build_dir,
            &mut self.templates_build_dir,
        ] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
        self.root = root.to_path_buf();
        self
    }

    /// Check every constraint, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        for (key, dir) in self.source_dirs() {
            if !dir.exists() {
                problems.push(format!("{key} `{}` does not exist", dir.display()));
            } else if !dir.is_dir() {
                problems.push(format!("{key} `{}` is not a directory", dir.display()));
            } else if dir.starts_with(&self.build_dir) {
                problems.push(format!("{key} `{}` is inside build_dir", dir.display()));
            } else if self.build_dir.starts_with(dir) {
                problems.push(format!("build_dir `{}` is inside {key}", self.build_dir.display()));
            }
        }

        // Seeding copies templates_dir into templates_build_dir; nesting
        // either way makes the copy walk its own output.
        if self.templates_build_dir.starts_with(&self.templates_dir)
            || self.templates_dir.starts_with(&self.templates_build_dir)
        {
            problems.push(format!(
                "templates_build_dir `{}` and templates_dir `{}` must not contain each other",
                self.templates_build_dir.display(),
                self.templates_dir.display()
            ));
        }

        for dir in &self.clear_dirs {
            let escapes = dir
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if dir.as_os_str().is_empty() || escapes {
                problems.push(format!(
                    "clear_dirs entry `{}` must be a relative path inside build_dir",
                    dir.display()
                ));
            }
        }

        if !self.text_lookup.contains(TEXT_KEY_PLACEHOLDER) {
            problems.push(format!("text_lookup must contain `{TEXT_KEY_PLACEHOLDER}`"));
        }

        if self.fetch_timeout_secs == 0 {
            problems.push("fetch_timeout_secs must be greater than 0".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems))
        }
    }

    fn source_dirs(&self) -> [(&'static str, &Path); 3] {
        [
            ("css_dir", &self.css_dir),
            ("js_dir", &self.js_dir),
            ("templates_dir", &self.templates_dir),
        ]
    }

    /// Persistent icon cache directory.
    pub fn icons_dir(&self) -> PathBuf {
        self.build_dir.join("icons")
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Default configuration as TOML, for `init`.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}
