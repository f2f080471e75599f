//! Compiler and fetch sub-sections.
//!
//! # Example
//!
//! ```toml
//! [css]
//! minify = false
//!
//! [js]
//! compress = true
//! mangle = true
//! minify_whitespace = true
//! comments = false
//! source_maps = false
//! ```

use serde::{Deserialize, Serialize};

/// `[css]` stylesheet compiler options.
///
/// There is no `source_maps` key here; only scripts get `.map` files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CssOptions {
    /// Print minified CSS.
    pub minify: bool,
}

/// `[js]` script compiler options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsOptions {
    /// Run the compressor (dead code, constant folding).
    pub compress: bool,
    /// Mangle local identifiers.
    pub mangle: bool,
    /// Strip whitespace in codegen.
    pub minify_whitespace: bool,
    /// Keep comments.
    pub comments: bool,
    /// Write `<name>.map` next to every script.
    pub source_maps: bool,
}

impl Default for JsOptions {
    fn default() -> Self {
        Self {
            compress: true,
            mangle: true,
            minify_whitespace: true,
            comments: false,
            source_maps: false,
        }
    }
}

/// What a failed icon fetch does to the rest of the fetch phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorPolicy {
    /// Stop at the first failure.
    Abort,
    /// Try every icon, then fail with all failures listed.
    #[default]
    Collect,
}
