//! assetpipe - compile, content-hash and cross-link static assets, then
//! expand template macros against the result.

mod asset;
mod build;
mod cli;
mod config;
mod icon;
mod logger;
mod template;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::BuildOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    if let Some(args) = cli.build_args() {
        logger::set_verbose(args.verbose);
    }

    if let Err(e) = run(&cli) {
        log!("error"; "{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Init { dry } => cli::init::write_config(&cli.config, *dry),
        Commands::Build { build_args } => {
            let options = BuildOptions::load(&cli.config)?;
            cli::build::build_assets(&options, build_args).map(|_| ())
        }
        Commands::Icons { build_args } => {
            let options = BuildOptions::load(&cli.config)?;
            cli::icons::resolve_icons(&options, build_args).map(|_| ())
        }
    }
}
