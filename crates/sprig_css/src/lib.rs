//! Hand-rolled parser for the subset of CSS that sprite analysis needs.
//!
//! The main entry point is [`parse_stylesheet`], which lexes and parses a
//! loaded source into a [`StyleSheet`]: rule sets with their selectors and
//! declarations, `@media` blocks, `@import` statements and other at-rules.
//! Declaration values are kept as typed [`Term`]s so that urls, keywords and
//! lengths can be inspected without re-tokenizing.
//!
//! Traversal goes through the [`Visitor`] trait.

#![warn(missing_docs)]

/// Rule tree node types.
pub mod ast;
/// Lexical analyzer for style-sheet text.
pub mod lexer;
/// Recursive descent parser with error recovery.
pub mod parser;
/// Token types produced by the lexer.
pub mod token;
/// Depth-first traversal of the rule tree.
pub mod visit;

pub use ast::{
    AtRule, AtRuleBody, Declaration, ImportRule, MediaRule, Rule, RuleSet, StyleSheet, Term,
    UrlValue, Value,
};
pub use token::{CssToken, Token};
pub use visit::Visitor;

use sprig_diagnostics::DiagnosticSink;
use sprig_source::{SourceId, SourceMap};

/// Parses a loaded style sheet.
///
/// Syntax errors are reported to `sink`; the returned tree holds whatever
/// could be recovered.
pub fn parse_stylesheet(source: SourceId, sources: &SourceMap, sink: &DiagnosticSink) -> StyleSheet {
    let file = sources.get(source);
    let tokens = lexer::lex(&file.text, source, sink);
    let mut parser = parser::CssParser::new(tokens, &file.text, sink);
    let rules = parser.parse_rules();
    StyleSheet {
        source,
        path: file.path.clone(),
        rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loaded_source() {
        let mut sources = SourceMap::new();
        let id = sources.add(
            "/site/css/main.css",
            ".a { background: url(../i/a.gif) }\n@media print { .b { color: black } }".to_string(),
        );
        let sink = DiagnosticSink::new();
        let sheet = parse_stylesheet(id, &sources, &sink);
        assert!(!sink.has_errors());
        assert_eq!(sheet.path, std::path::PathBuf::from("/site/css/main.css"));
        assert_eq!(sheet.rules.len(), 2);
    }

    #[test]
    fn tree_serializes() {
        let mut sources = SourceMap::new();
        let id = sources.add("/a.css", ".a { color: red }".to_string());
        let sink = DiagnosticSink::new();
        let sheet = parse_stylesheet(id, &sources, &sink);
        let json = serde_json::to_string(&sheet).unwrap();
        let back: StyleSheet = serde_json::from_str(&json).unwrap();
        assert_eq!(sheet, back);
    }
}
