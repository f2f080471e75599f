//! `build` command.

use anyhow::Result;

use super::{BuildArgs, icon_source};
use crate::build::{BuildReport, BuildVariables, Builder};
use crate::config::BuildOptions;
use crate::{debug, log};

/// Run one full build.
pub fn build_assets(options: &BuildOptions, args: &BuildArgs) -> Result<BuildReport> {
    let vars = BuildVariables::detect(&options.root, args.revision.as_deref());
    debug!("build"; "revision {} at {}", vars.commit_short, vars.build_time);

    let report = Builder::new(options, vars, icon_source(options, args)).run()?;

    if let Some(copied) = report.seeded {
        debug!("build"; "seeded {} template files", copied);
    }
    log!("build"; "took {}ms", report.elapsed.as_millis());
    Ok(report)
}
