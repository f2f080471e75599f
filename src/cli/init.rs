//! `init` command: write a default config file.

use anyhow::Result;
use std::{fs, path::Path};

use crate::config::{BuildOptions, ConfigError};
use crate::log;

/// Default config with a header comment.
pub fn generate_config_template() -> String {
    let mut out = format!(
        "# assetpipe configuration file (v{})\n# Paths are relative to this file.\n\n",
        env!("CARGO_PKG_VERSION")
    );
    out.push_str(&BuildOptions::default_toml());
    out
}

/// Write the default config to `path`, refusing to overwrite an existing
/// file. With `dry` the config is printed instead.
pub fn write_config(path: &Path, dry: bool) -> Result<()> {
    let template = generate_config_template();
    if dry {
        print!("{template}");
        return Ok(());
    }

    if path.exists() {
        return Err(ConfigError::Exists(path.to_path_buf()).into());
    }
    fs::write(path, template).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

    log!("init"; "wrote {}", path.display());
    Ok(())
}
