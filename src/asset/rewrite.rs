//! Rewriting references to hashed artifacts.
//!
//! Recognized reference forms, all matched as exact substrings:
//!
//! | Category | Form                                   |
//! |----------|----------------------------------------|
//! | css      | `@import "name.css"`                   |
//! | css      | `href="<public>/css/<dir/>name.css"`   |
//! | js       | `use("name")` (extension stripped)     |
//! | js       | `reg_ns("name")` (extension stripped)  |
//! | js       | `src="<public>/js/<dir/>name.js"`      |
//!
//! Anything else, including a reference to a name that was never hashed,
//! is left untouched.

use super::AssetCategory;
use super::hash::{HashTable, stem};

/// Every textual form in which `name` can be referenced.
pub fn reference_forms(
    category: AssetCategory,
    name: &str,
    rel_dir: &str,
    public_path: &str,
) -> Vec<String> {
    let public = public_path.trim_end_matches('/');
    let url = format!("{public}/{}/{rel_dir}{name}", category.dir_name());
    match category {
        AssetCategory::Style => vec![format!("@import \"{name}\""), format!("href=\"{url}\"")],
        AssetCategory::Script => {
            let module = stem(name);
            vec![
                format!("use(\"{module}\""),
                format!("reg_ns(\"{module}\""),
                format!("src=\"{url}\""),
            ]
        }
    }
}

/// Whether `text` references `name` in any recognized form.
pub fn mentions(
    text: &str,
    category: AssetCategory,
    name: &str,
    rel_dir: &str,
    public_path: &str,
) -> bool {
    reference_forms(category, name, rel_dir, public_path)
        .iter()
        .any(|form| text.contains(form.as_str()))
}

/// Applies every mapping of a [`HashTable`] to a text.
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    table: &'a HashTable,
    public_path: &'a str,
}

impl<'a> Rewriter<'a> {
    pub fn new(table: &'a HashTable, public_path: &'a str) -> Self {
        Self { table, public_path }
    }

    /// Replace every recognized reference with its hashed form.
    pub fn rewrite(&self, text: &str) -> String {
        self.rewrite_except(text, None)
    }

    /// Like [`Rewriter::rewrite`], leaving references to `skip` alone.
    pub fn rewrite_except(&self, text: &str, skip: Option<&str>) -> String {
        let mut out = text.to_string();
        for (name, asset) in self.table.iter() {
            if skip == Some(name) {
                continue;
            }
            let from = reference_forms(asset.category, name, &asset.rel_dir, self.public_path);
            let to = reference_forms(asset.category, &asset.hashed, &asset.rel_dir, self.public_path);
            for (from, to) in from.iter().zip(&to) {
                if out.contains(from.as_str()) {
                    out = out.replace(from.as_str(), to);
                }
            }
        }
        out
    }
}
