//! Macro expansion for one template.
//!
//! Expansion order per macro is fixed: variables, localized text, icons.
//! Hashed-name rewriting runs last and only over the template's own text,
//! so markup inserted for an icon is never rewritten.

use std::sync::Arc;

use super::macros::{Token, tokenize};
use crate::asset::Rewriter;
use crate::build::{BuildError, BuildVariables};
use crate::config::TEXT_KEY_PLACEHOLDER;
use crate::icon::{IconStore, icon_class, with_class};

/// Read access to resolved icon markup.
pub trait IconLookup: Sync {
    fn markup(&self, name: &str) -> Option<Arc<str>>;
}

impl IconLookup for IconStore {
    fn markup(&self, name: &str) -> Option<Arc<str>> {
        self.get(name)
    }
}

/// Everything expansion reads. Shared by all templates of a build.
pub struct Expander<'a> {
    pub vars: &'a BuildVariables,
    pub icons: &'a dyn IconLookup,
    pub rewriter: Rewriter<'a>,
    /// Replacement for `{{ text "key" }}` with a `{key}` placeholder.
    pub text_lookup: &'a str,
}

impl Expander<'_> {
    /// Expand every macro in `input`. `template` names the file in errors.
    pub fn expand(&self, template: &str, input: &str) -> Result<String, BuildError> {
        let mut out = String::with_capacity(input.len());

        for token in tokenize(input) {
            match token {
                Token::Literal(text) => out.push_str(&self.rewriter.rewrite(text)),
                Token::Var { name, raw } => out.push_str(self.vars.get(name).unwrap_or(raw)),
                Token::Text(key) => out.push_str(&self.text_lookup.replace(TEXT_KEY_PLACEHOLDER, key)),
                Token::Icon { name, classes } => {
                    let markup = self.icons.markup(name).ok_or_else(|| BuildError::UnresolvedIcon {
                        template: template.to_string(),
                        icon: name.to_string(),
                    })?;
                    out.push_str(&with_class(&markup, &icon_class(classes)));
                }
            }
        }

        Ok(out)
    }
}
