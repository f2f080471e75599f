//! Asset category definitions.

use std::fmt;

/// Category of compiled asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// Stylesheet, built into `<build_dir>/css/`.
    Style,
    /// Script, built into `<build_dir>/js/`.
    Script,
}

impl AssetCategory {
    /// Sub-directory of the build root (also the public URL segment).
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Style => "css",
            Self::Script => "js",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
