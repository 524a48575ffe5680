//! Recursive descent parser for style sheets.
//!
//! The [`CssParser`] consumes the token stream produced by the lexer and
//! builds the rule tree. Syntax errors are reported to the sink and the
//! parser resynchronizes at the next `;` or `}` so one bad declaration does
//! not hide the rest of the sheet.

use crate::ast::*;
use crate::token::{CssToken, Token};
use sprig_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use sprig_source::Span;

/// Code for syntax errors.
pub const PARSE_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);

/// At-rules whose block holds declarations rather than nested rules.
const DECLARATION_AT_RULES: &[&str] = &["font-face", "page", "counter-style", "property", "viewport"];

/// A recursive descent parser over one style sheet.
pub struct CssParser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    text: &'src str,
    sink: &'src DiagnosticSink,
}

impl<'src> CssParser<'src> {
    /// Creates a parser. `tokens` must have been lexed from `text`.
    pub fn new(tokens: Vec<Token>, text: &'src str, sink: &'src DiagnosticSink) -> Self {
        Self {
            tokens,
            pos: 0,
            text,
            sink,
        }
    }

    fn current(&self) -> &CssToken {
        &self.tokens[self.pos].kind
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    fn at(&self, kind: &CssToken) -> bool {
        self.current() == kind
    }

    fn at_eof(&self) -> bool {
        self.tokens[self.pos].is_eof()
    }

    fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: &CssToken) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, msg: &str) {
        self.sink
            .emit(Diagnostic::error(PARSE_ERROR, msg, self.current_span()));
    }

    /// Source text between two spans, comments removed and whitespace collapsed.
    fn text_between(&self, first: Span, last: Span) -> String {
        let start = first.start as usize;
        let end = (last.end as usize).max(start);
        clean_text(&self.text[start..end])
    }

    /// Skips to the end of the current declaration: past the next `;`, or up
    /// to (not past) the `}` that closes the enclosing block.
    fn recover_in_block(&mut self) {
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.current() {
                CssToken::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                CssToken::RBrace if depth == 0 => return,
                CssToken::LBrace | CssToken::LParen | CssToken::Function(_) => depth += 1,
                CssToken::RBrace | CssToken::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }
    }

    /// Parses the whole token stream into top-level rules.
    pub fn parse_rules(&mut self) -> Vec<Rule> {
        let mut rules = Vec::new();
        while !self.at_eof() {
            match self.current() {
                CssToken::RBrace => {
                    self.error("unexpected '}'");
                    self.advance();
                }
                CssToken::Semicolon => self.advance(),
                _ => {
                    if let Some(rule) = self.parse_rule() {
                        rules.push(rule);
                    }
                }
            }
        }
        rules
    }

    fn parse_rule(&mut self) -> Option<Rule> {
        if let CssToken::AtKeyword(name) = self.current() {
            let name = name.to_ascii_lowercase();
            return self.parse_at_rule(name);
        }
        self.parse_rule_set().map(Rule::RuleSet)
    }

    /// Parses rules up to the `}` closing a block whose `{` was consumed.
    fn parse_rule_block(&mut self) -> Vec<Rule> {
        let mut rules = Vec::new();
        loop {
            match self.current() {
                CssToken::RBrace => {
                    self.advance();
                    return rules;
                }
                CssToken::Eof => {
                    self.error("unclosed block");
                    return rules;
                }
                CssToken::Semicolon => self.advance(),
                _ => {
                    if let Some(rule) = self.parse_rule() {
                        rules.push(rule);
                    }
                }
            }
        }
    }

    fn parse_rule_set(&mut self) -> Option<RuleSet> {
        let start = self.current_span();
        let mut selectors = Vec::new();
        let mut group: Option<(Span, Span)> = None;
        let mut depth = 0usize;

        loop {
            match self.current() {
                CssToken::LBrace if depth == 0 => break,
                CssToken::Comma if depth == 0 => {
                    if let Some((first, last)) = group.take() {
                        selectors.push(self.text_between(first, last));
                    }
                    self.advance();
                    continue;
                }
                CssToken::Eof => {
                    self.error("expected '{' after selector");
                    return None;
                }
                CssToken::Semicolon | CssToken::RBrace if depth == 0 => {
                    self.error("expected '{' after selector");
                    self.eat(&CssToken::Semicolon);
                    return None;
                }
                CssToken::LParen | CssToken::Function(_) => depth += 1,
                CssToken::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            let span = self.current_span();
            group = Some(match group {
                Some((first, _)) => (first, span),
                None => (span, span),
            });
            self.advance();
        }
        if let Some((first, last)) = group {
            selectors.push(self.text_between(first, last));
        }
        if selectors.is_empty() {
            self.error("expected selector");
        }

        self.advance();
        let declarations = self.parse_declaration_block();
        Some(RuleSet {
            selectors,
            declarations,
            span: start.to(self.prev_span()),
        })
    }

    /// Parses declarations up to the `}` closing a block whose `{` was consumed.
    fn parse_declaration_block(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            match self.current() {
                CssToken::RBrace => {
                    self.advance();
                    return declarations;
                }
                CssToken::Eof => {
                    self.error("unclosed block");
                    return declarations;
                }
                CssToken::Semicolon => self.advance(),
                _ => {
                    if let Some(decl) = self.parse_declaration() {
                        declarations.push(decl);
                    }
                }
            }
        }
    }

    fn parse_declaration(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        let property = match self.current() {
            CssToken::Ident(name) => name.to_ascii_lowercase(),
            _ => {
                self.error("expected property name");
                self.recover_in_block();
                return None;
            }
        };
        self.advance();
        if !self.eat(&CssToken::Colon) {
            self.error(&format!("expected ':' after '{property}'"));
            self.recover_in_block();
            return None;
        }

        let mut terms = Vec::new();
        let mut important = false;
        loop {
            match self.current() {
                CssToken::Semicolon | CssToken::RBrace | CssToken::Eof => break,
                CssToken::LBrace => {
                    self.error("unexpected '{' in declaration value");
                    self.recover_in_block();
                    return None;
                }
                CssToken::Delim('!') => {
                    self.advance();
                    match self.current() {
                        CssToken::Ident(word) if word.eq_ignore_ascii_case("important") => {
                            important = true;
                            self.advance();
                        }
                        _ => terms.push(Term::Delim('!')),
                    }
                }
                _ => {
                    if let Some(term) = self.parse_term() {
                        terms.push(term);
                    }
                }
            }
        }

        Some(Declaration {
            property,
            value: Value::new(terms),
            important,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_term(&mut self) -> Option<Term> {
        let term = match self.current().clone() {
            CssToken::Url(raw) => Term::Url(UrlValue::from_raw(&raw)),
            CssToken::Ident(s) => Term::Ident(s),
            CssToken::Hash(s) => Term::Hash(s),
            CssToken::Str(s) => Term::Str(s),
            CssToken::Number(value) => Term::Number { value, unit: None },
            CssToken::Dimension(value, unit) => Term::Number {
                value,
                unit: Some(unit),
            },
            CssToken::Percentage(v) => Term::Percentage(v),
            CssToken::Comma => Term::Comma,
            CssToken::Delim('/') => Term::Slash,
            CssToken::Delim(c) => Term::Delim(c),
            CssToken::Colon => Term::Delim(':'),
            CssToken::Function(name) => {
                self.advance();
                let args = self.parse_function_args();
                return Some(Term::Function { name, args });
            }
            CssToken::LParen => {
                self.advance();
                let args = self.parse_function_args();
                return Some(Term::Function {
                    name: String::new(),
                    args,
                });
            }
            CssToken::RParen => {
                self.error("unbalanced ')'");
                self.advance();
                return None;
            }
            // Already reported by the lexer.
            CssToken::Error => {
                self.advance();
                return None;
            }
            CssToken::AtKeyword(_)
            | CssToken::Semicolon
            | CssToken::LBrace
            | CssToken::RBrace
            | CssToken::Eof => return None,
        };
        self.advance();
        Some(term)
    }

    /// Parses arguments up to and including the closing `)`.
    fn parse_function_args(&mut self) -> Vec<Term> {
        let mut args = Vec::new();
        loop {
            match self.current() {
                CssToken::RParen => {
                    self.advance();
                    return args;
                }
                CssToken::Semicolon | CssToken::RBrace | CssToken::LBrace | CssToken::Eof => {
                    self.error("expected ')'");
                    return args;
                }
                _ => {
                    if let Some(term) = self.parse_term() {
                        args.push(term);
                    }
                }
            }
        }
    }

    fn parse_at_rule(&mut self, name: String) -> Option<Rule> {
        let start = self.current_span();
        self.advance();

        if name == "import" {
            return self.parse_import(start);
        }

        let prelude = self.parse_prelude();
        if self.eat(&CssToken::Semicolon) {
            return Some(Rule::AtRule(AtRule {
                name,
                prelude,
                body: AtRuleBody::None,
                span: start.to(self.prev_span()),
            }));
        }
        if !self.eat(&CssToken::LBrace) {
            self.error(&format!("expected '{{' or ';' after '@{name}'"));
            self.recover_in_block();
            return None;
        }

        if name == "media" {
            let rules = self.parse_rule_block();
            return Some(Rule::Media(MediaRule {
                query: prelude,
                rules,
                span: start.to(self.prev_span()),
            }));
        }

        let body = if DECLARATION_AT_RULES.contains(&name.as_str()) {
            AtRuleBody::Declarations(self.parse_declaration_block())
        } else {
            AtRuleBody::Rules(self.parse_rule_block())
        };
        Some(Rule::AtRule(AtRule {
            name,
            prelude,
            body,
            span: start.to(self.prev_span()),
        }))
    }

    /// Collects the text up to the next depth-0 `{`, `;` or `}`.
    fn parse_prelude(&mut self) -> String {
        let mut range: Option<(Span, Span)> = None;
        let mut depth = 0usize;
        loop {
            match self.current() {
                CssToken::LBrace | CssToken::Semicolon | CssToken::RBrace if depth == 0 => break,
                CssToken::Eof => break,
                CssToken::LParen | CssToken::Function(_) => depth += 1,
                CssToken::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            let span = self.current_span();
            range = Some(match range {
                Some((first, _)) => (first, span),
                None => (span, span),
            });
            self.advance();
        }
        range
            .map(|(first, last)| self.text_between(first, last))
            .unwrap_or_default()
    }

    fn parse_import(&mut self, start: Span) -> Option<Rule> {
        let target = match self.current() {
            CssToken::Url(raw) | CssToken::Str(raw) => UrlValue::from_raw(raw),
            _ => {
                self.error("expected url or string after '@import'");
                self.recover_in_block();
                return None;
            }
        };
        self.advance();
        let media = self.parse_prelude();
        if !self.eat(&CssToken::Semicolon) {
            self.error("expected ';' after '@import'");
            self.recover_in_block();
        }
        Some(Rule::Import(ImportRule {
            target,
            media,
            span: start.to(self.prev_span()),
        }))
    }
}

/// Removes `/* */` comments and collapses runs of whitespace.
fn clean_text(raw: &str) -> String {
    let mut stripped = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find("/*") {
        stripped.push_str(&rest[..open]);
        stripped.push(' ');
        rest = match rest[open + 2..].find("*/") {
            Some(close) => &rest[open + 2 + close + 2..],
            None => "",
        };
    }
    stripped.push_str(rest);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
