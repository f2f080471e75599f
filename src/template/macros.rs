//! Single-pass scanner for `{{ ... }}` template macros.
//!
//! Recognized forms:
//!
//! ```text
//! {{ var "name" }}
//! {{ text "key" }}
//! {{ icon "name" }}
//! {{ icon "name" c(big muted) }}
//! ```
//!
//! Anything else between double braces belongs to the downstream template
//! engine and is passed through as literal text. Substituted output is never
//! scanned again.

use std::sync::LazyLock;

use regex::Regex;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Body of a recognized macro, without the braces.
static MACRO_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(icon|text|var)\s*"([^"]*)"\s*(?:c\(([^)]*)\)\s*)?$"#).unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Text to copy as-is. Adjacent literal runs are merged.
    Literal(&'a str),
    Var {
        name: &'a str,
        /// The whole `{{ ... }}`, emitted as-is when `name` is unknown.
        raw: &'a str,
    },
    Text(&'a str),
    Icon {
        name: &'a str,
        /// Contents of `c(...)`, trimmed; `None` for the bare form.
        classes: Option<&'a str>,
    },
}

/// Split `input` into literal runs and macros.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    // Start of the literal run not yet pushed
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(open) = input[cursor..].find(OPEN).map(|i| cursor + i) {
        let body_start = open + OPEN.len();
        let Some(close) = input[body_start..].find(CLOSE).map(|i| body_start + i) else {
            break;
        };

        let end = close + CLOSE.len();
        if let Some(token) = parse_macro(&input[open..end], &input[body_start..close]) {
            if literal_start < open {
                tokens.push(Token::Literal(&input[literal_start..open]));
            }
            tokens.push(token);
            literal_start = end;
            cursor = end;
        } else {
            // Resume one byte in: `{{{ icon "x" }}}` opens at the second brace
            cursor = open + 1;
        }
    }

    if literal_start < input.len() {
        tokens.push(Token::Literal(&input[literal_start..]));
    }
    tokens
}

fn parse_macro<'a>(raw: &'a str, body: &'a str) -> Option<Token<'a>> {
    let caps = MACRO_BODY.captures(body)?;
    let kind = caps.get(1)?.as_str();
    let arg = caps.get(2)?.as_str();
    let classes = caps.get(3).map(|m| m.as_str().trim());

    match (kind, classes) {
        ("icon", classes) => Some(Token::Icon { name: arg, classes }),
        // `c(...)` only applies to icons
        (_, Some(_)) => None,
        ("text", None) => Some(Token::Text(arg)),
        ("var", None) => Some(Token::Var { name: arg, raw }),
        _ => None,
    }
}

/// Icon names referenced by `input`, in order of appearance (with repeats).
pub fn icon_names(input: &str) -> impl Iterator<Item = &str> {
    tokenize(input).into_iter().filter_map(|token| match token {
        Token::Icon { name, .. } => Some(name),
        _ => None,
    })
}
