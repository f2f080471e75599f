//! Icon resolution: discover names in templates, then fetch what the on-disk
//! cache does not have yet.

mod inject;
mod scan;
mod source;
mod store;

pub use inject::{icon_class, with_class};
pub use scan::{IconRequest, discover_icons};
pub use source::{HttpIconSource, IconError, IconErrorKind, IconSource, OfflineSource};
pub use store::{FetchSummary, IconStore, Resolution};
