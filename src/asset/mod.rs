//! Stylesheet and script compilation with content-hashed output names.

pub mod hash;
mod kind;
pub mod minify;
mod process;
pub mod rewrite;
pub mod walk;

// Types
pub use hash::{HashTable, HashedAsset, HashingPolicy};
pub use kind::AssetCategory;
pub use minify::{Compiled, Compiler, CssCompiler, JsCompiler};
pub use rewrite::Rewriter;
pub use walk::{WalkEntry, WalkMode, walk_tree};

// Processing (side effects)
pub use process::{CategoryBuild, compile_category};
