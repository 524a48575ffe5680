use serde::{Deserialize, Serialize};
use sprig_source::Span;

/// The kinds of token produced by the lexer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CssToken {
    /// An identifier such as `background` or `no-repeat`.
    Ident(String),
    /// `@media`, stored without the `@`.
    AtKeyword(String),
    /// `#fff`, stored without the `#`.
    Hash(String),
    /// A quoted string with quotes removed and escapes resolved.
    Str(String),
    /// The contents of `url(...)`, unquoted and trimmed.
    Url(String),
    /// A function name; the opening parenthesis is consumed with it.
    Function(String),
    /// A unitless number.
    Number(f64),
    /// A number followed by `%`.
    Percentage(f64),
    /// A number followed by a unit, e.g. `10px`.
    Dimension(f64, String),
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// Any other single character.
    Delim(char),
    /// A malformed token; a diagnostic has already been emitted.
    Error,
    /// End of input.
    Eof,
}

/// A token with its location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// What was lexed.
    pub kind: CssToken,
    /// Where it was lexed.
    pub span: Span,
}

impl Token {
    /// Returns `true` if this is the end-of-input token.
    pub fn is_eof(&self) -> bool {
        self.kind == CssToken::Eof
    }
}
