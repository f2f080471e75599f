//! `icons` command: warm the icon cache without building.

use anyhow::Result;
use std::time::Instant;

use super::{BuildArgs, icon_source};
use crate::build::{BuildVariables, Builder, IconReport};
use crate::config::BuildOptions;
use crate::log;

pub fn resolve_icons(options: &BuildOptions, args: &BuildArgs) -> Result<IconReport> {
    let started = Instant::now();
    let vars = BuildVariables::detect(&options.root, args.revision.as_deref());

    let report = Builder::new(options, vars, icon_source(options, args))
        .with_progress(false)
        .run_icons()?;

    for name in &report.names {
        log!("icons"; "{}", options.icons_dir().join(format!("{name}.svg")).display());
    }
    log!(
        "icons";
        "{} icons ({} fetched, {} cached), took {}ms",
        report.names.len(),
        report.summary.fetched,
        report.summary.cached,
        started.elapsed().as_millis()
    );
    Ok(report)
}
