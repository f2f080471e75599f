//! Command-line interface module.

mod args;
pub mod build;
pub mod icons;
pub mod init;

pub use args::{BuildArgs, Cli, Commands};

use crate::config::BuildOptions;
use crate::icon::{HttpIconSource, IconSource, OfflineSource};

/// Icon source for a run: the configured endpoint, or nothing with `--no-fetch`.
fn icon_source(options: &BuildOptions, args: &BuildArgs) -> Box<dyn IconSource> {
    if args.no_fetch {
        Box::new(OfflineSource)
    } else {
        Box::new(HttpIconSource::new(
            &options.icons_endpoint,
            options.fetch_timeout(),
        ))
    }
}
