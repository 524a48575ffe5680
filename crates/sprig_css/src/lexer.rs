//! Lexical analyzer for the modeled CSS subset.
//!
//! Produces [`Token`]s for identifiers, at-keywords, hashes, strings,
//! `url(...)`, functions, numbers with units and punctuation. Comments and
//! whitespace are skipped. Malformed input is reported to the
//! [`DiagnosticSink`] and yields [`CssToken::Error`].

use crate::token::{CssToken, Token};
use sprig_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use sprig_source::{SourceId, Span};

/// Code for lexical errors.
pub const LEX_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);

/// Lexes `text`. The returned vector always ends with [`CssToken::Eof`].
pub fn lex(text: &str, source: SourceId, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        source,
        sink,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    source: SourceId,
    sink: &'a DiagnosticSink,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            if self.pos >= self.bytes.len() {
                tokens.push(Token {
                    kind: CssToken::Eof,
                    span: self.span_from(self.pos),
                });
                return tokens;
            }
            tokens.push(self.next_token());
        }
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.source, start as u32, self.pos as u32)
    }

    fn error(&self, msg: &str, span: Span) {
        self.sink.emit(Diagnostic::error(LEX_ERROR, msg, span));
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.peek().is_ascii_whitespace() && self.pos < self.bytes.len() {
                self.pos += 1;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.pos >= self.bytes.len() {
                        self.error("unterminated comment", self.span_from(start));
                        break;
                    }
                    if self.peek() == b'*' && self.peek_at(1) == b'/' {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }
            // HTML comment delimiters are allowed around embedded style sheets.
            if self.text[self.pos..].starts_with("<!--") {
                self.pos += 4;
                continue;
            }
            if self.text[self.pos..].starts_with("-->") {
                self.pos += 3;
                continue;
            }
            return;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();

        let kind = match b {
            b'"' | b'\'' => self.lex_string(),
            b'#' if is_name_byte(self.peek_at(1)) => {
                self.pos += 1;
                CssToken::Hash(self.read_name())
            }
            b'@' if is_ident_start(self.peek_at(1), self.peek_at(2)) => {
                self.pos += 1;
                CssToken::AtKeyword(self.read_name())
            }
            b'0'..=b'9' => self.lex_numeric(),
            b'.' if self.peek_at(1).is_ascii_digit() => self.lex_numeric(),
            b'+' | b'-'
                if self.peek_at(1).is_ascii_digit()
                    || (self.peek_at(1) == b'.' && self.peek_at(2).is_ascii_digit()) =>
            {
                self.lex_numeric()
            }
            _ if is_ident_start(b, self.peek_at(1)) => self.lex_ident_like(),
            _ => {
                self.pos += 1;
                match b {
                    b':' => CssToken::Colon,
                    b';' => CssToken::Semicolon,
                    b',' => CssToken::Comma,
                    b'{' => CssToken::LBrace,
                    b'}' => CssToken::RBrace,
                    b'(' => CssToken::LParen,
                    b')' => CssToken::RParen,
                    _ => {
                        // Step back and take the whole (possibly multi-byte) character.
                        self.pos = start;
                        let ch = self.text[start..].chars().next().unwrap_or('\u{fffd}');
                        self.pos += ch.len_utf8();
                        CssToken::Delim(ch)
                    }
                }
            }
        };

        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.bytes.len() {
            if self.peek() == b'\\' && self.pos + 1 < self.bytes.len() {
                self.pos += 2;
            } else if is_name_byte(self.peek()) {
                self.pos += 1;
            } else {
                break;
            }
        }
        unescape(&self.text[start..self.pos])
    }

    fn lex_ident_like(&mut self) -> CssToken {
        let name = self.read_name();
        if self.peek() != b'(' {
            return CssToken::Ident(name);
        }
        self.pos += 1;
        if name.eq_ignore_ascii_case("url") {
            return self.lex_url_body();
        }
        CssToken::Function(name)
    }

    /// Lexes the body of `url(` up to and including the closing `)`.
    fn lex_url_body(&mut self) -> CssToken {
        let start = self.pos;
        while self.peek().is_ascii_whitespace() && self.pos < self.bytes.len() {
            self.pos += 1;
        }

        let content = if matches!(self.peek(), b'"' | b'\'') {
            match self.lex_string() {
                CssToken::Str(s) => s,
                _ => return CssToken::Error,
            }
        } else {
            let body_start = self.pos;
            while self.pos < self.bytes.len() && self.peek() != b')' {
                if self.peek() == b'\\' {
                    self.pos += 1;
                }
                self.pos += 1;
            }
            let end = self.pos.min(self.bytes.len());
            unescape(self.text[body_start..end].trim_end())
        };

        while self.peek().is_ascii_whitespace() && self.pos < self.bytes.len() {
            self.pos += 1;
        }
        if self.peek() != b')' {
            self.error("unterminated url()", self.span_from(start));
            return CssToken::Error;
        }
        self.pos += 1;
        CssToken::Url(content.trim().to_string())
    }

    fn lex_string(&mut self) -> CssToken {
        let start = self.pos;
        let quote = self.peek();
        self.pos += 1;
        let mut value = String::new();
        loop {
            if self.pos >= self.bytes.len() || self.peek() == b'\n' {
                self.error("unterminated string", self.span_from(start));
                return CssToken::Error;
            }
            let b = self.peek();
            if b == quote {
                self.pos += 1;
                return CssToken::Str(value);
            }
            if b == b'\\' && self.pos + 1 < self.bytes.len() {
                let escaped = &self.text[self.pos + 1..];
                let ch = escaped.chars().next().unwrap_or('\\');
                self.pos += 1 + ch.len_utf8();
                if ch != '\n' {
                    value.push(ch);
                }
                continue;
            }
            let ch = self.text[self.pos..].chars().next().unwrap_or('\u{fffd}');
            value.push(ch);
            self.pos += ch.len_utf8();
        }
    }

    fn lex_numeric(&mut self) -> CssToken {
        let start = self.pos;
        if matches!(self.peek(), b'+' | b'-') {
            self.pos += 1;
        }
        while self.peek().is_ascii_digit() {
            self.pos += 1;
        }
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.pos += 1;
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
        }
        let number_text = &self.text[start..self.pos];
        let value: f64 = match number_text.parse() {
            Ok(v) => v,
            Err(_) => {
                self.error("malformed number", self.span_from(start));
                return CssToken::Error;
            }
        };

        if self.peek() == b'%' {
            self.pos += 1;
            return CssToken::Percentage(value);
        }
        if is_ident_start(self.peek(), self.peek_at(1)) {
            let unit = self.read_name();
            return CssToken::Dimension(value, unit.to_ascii_lowercase());
        }
        CssToken::Number(value)
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn is_ident_start(b: u8, next: u8) -> bool {
    match b {
        b'a'..=b'z' | b'A'..=b'Z' | b'_' | 0x80..=0xff | b'\\' => true,
        b'-' => next.is_ascii_alphabetic() || next == b'-' || next == b'_' || next >= 0x80,
        _ => false,
    }
}

/// Drops the backslash of simple escapes (`\:` becomes `:`).
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
