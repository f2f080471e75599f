//! Stylesheet and script compilers.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Both are pure: source
//! text in, compiled text out; the caller owns every filesystem write.

use std::path::PathBuf;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::config::{CssOptions, JsOptions};

/// Output of one compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub code: String,
    /// JSON source map, when the compiler was asked for one.
    pub source_map: Option<String>,
}

impl Compiled {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            source_map: None,
        }
    }
}

/// A per-file transform. Errors carry a human-readable message; the caller
/// attaches the file name.
pub trait Compiler: Sync {
    fn compile(&self, file_name: &str, source: &str) -> Result<Compiled, String>;
}

/// lightningcss parse + print.
///
/// Never produces a source map; `[js] source_maps` has no CSS counterpart.
#[derive(Debug, Clone, Default)]
pub struct CssCompiler {
    pub options: CssOptions,
}

impl CssCompiler {
    pub fn new(options: CssOptions) -> Self {
        Self { options }
    }
}

impl Compiler for CssCompiler {
    fn compile(&self, file_name: &str, source: &str) -> Result<Compiled, String> {
        let stylesheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: file_name.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: self.options.minify,
                ..PrinterOptions::default()
            })
            .map_err(|e| e.to_string())?;

        Ok(Compiled::code(result.code))
    }
}

/// oxc parse, optional compress/mangle, codegen.
#[derive(Debug, Clone, Default)]
pub struct JsCompiler {
    pub options: JsOptions,
}

impl JsCompiler {
    pub fn new(options: JsOptions) -> Self {
        Self { options }
    }
}

impl Compiler for JsCompiler {
    fn compile(&self, file_name: &str, source: &str) -> Result<Compiled, String> {
        let allocator = Allocator::default();
        let source_type = SourceType::mjs().with_jsx(true);

        let ret = Parser::new(&allocator, source, source_type).parse();
        if ret.panicked || !ret.errors.is_empty() {
            let messages: Vec<String> = ret.errors.iter().map(ToString::to_string).collect();
            return Err(if messages.is_empty() {
                "parser aborted".to_string()
            } else {
                messages.join("; ")
            });
        }

        let mut program = ret.program;
        let options = MinifierOptions {
            mangle: self.options.mangle.then(MangleOptions::default),
            compress: self.options.compress.then(CompressOptions::smallest),
        };
        let ret = Minifier::new(options).minify(&allocator, &mut program);

        let comments = if self.options.comments {
            CommentOptions::default()
        } else {
            CommentOptions::disabled()
        };
        let output = Codegen::new()
            .with_options(CodegenOptions {
                minify: self.options.minify_whitespace,
                comments,
                source_map_path: self
                    .options
                    .source_maps
                    .then(|| PathBuf::from(file_name)),
                ..CodegenOptions::default()
            })
            .with_scoping(ret.scoping)
            .build(&program);

        Ok(Compiled {
            code: output.code,
            source_map: output.map.map(|map| map.to_json_string()),
        })
    }
}
