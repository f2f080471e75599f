//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

/// Static asset build pipeline
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (`.json` is read as JSON)
    #[arg(short = 'C', long, global = true, default_value = DEFAULT_CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a default config file
    #[command(visible_alias = "i")]
    Init {
        /// Print the config to stdout instead of writing it
        #[arg(long)]
        dry: bool,
    },

    /// Compile, hash and cross-link assets, then expand templates
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Resolve template icons into the icon cache only
    Icons {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

/// Shared arguments for Build and Icons
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Never hit the network; icons missing from the cache fail the build
    #[arg(long)]
    pub no_fetch: bool,

    /// Revision for `{{ var "commit" }}` instead of the repository HEAD
    #[arg(short, long)]
    pub revision: Option<String>,
}

impl Cli {
    /// Build arguments of the active command, if it takes any.
    pub const fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Commands::Build { build_args } | Commands::Icons { build_args } => Some(build_args),
            Commands::Init { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_flags() {
        let cli = Cli::parse_from(["assetpipe", "-C", "site/builder.json", "b", "-V", "--no-fetch", "-r", "abc123"]);
        assert_eq!(cli.config, PathBuf::from("site/builder.json"));
        let args = cli.build_args().unwrap();
        assert!(args.verbose);
        assert!(args.no_fetch);
        assert_eq!(args.revision.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["assetpipe", "init"]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(cli.build_args().is_none());
    }
}
