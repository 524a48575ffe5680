use serde::{Deserialize, Serialize};
use sprig_source::{SourceId, Span};
use std::fmt;
use std::path::PathBuf;

/// A parsed style sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    /// The loaded source this tree was parsed from.
    pub source: SourceId,
    /// Absolute path of the style sheet; relative urls resolve against its directory.
    pub path: PathBuf,
    /// Top-level rules in document order.
    pub rules: Vec<Rule>,
}

/// Any rule that can appear at the top level or inside a block at-rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    /// `selectors { declarations }`
    RuleSet(RuleSet),
    /// `@media query { rules }`
    Media(MediaRule),
    /// `@import url media;`
    Import(ImportRule),
    /// Every other at-rule (`@font-face`, `@page`, `@keyframes`, `@charset`, ...).
    AtRule(AtRule),
}

/// A selector list with its declaration block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Individual selectors, whitespace-collapsed, in source order.
    pub selectors: Vec<String>,
    /// Declarations in source order, repeats included.
    pub declarations: Vec<Declaration>,
    /// From the first selector to the closing brace.
    pub span: Span,
}

impl RuleSet {
    /// The selector list as written, e.g. `.a, .b:hover`.
    pub fn selector_text(&self) -> String {
        self.selectors.join(", ")
    }

    /// Declarations whose property equals `name` (case-insensitive).
    pub fn declarations_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Declaration> + 'n
    where
        'a: 'n,
    {
        self.declarations
            .iter()
            .filter(move |d| d.property.eq_ignore_ascii_case(name))
    }
}

/// `@media` block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaRule {
    /// The media query text, e.g. `screen and (min-width: 40em)`.
    pub query: String,
    /// Nested rules.
    pub rules: Vec<Rule>,
    /// Whole rule.
    pub span: Span,
}

/// `@import` statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportRule {
    /// The imported style sheet.
    pub target: UrlValue,
    /// Trailing media list, possibly empty.
    pub media: String,
    /// Whole statement.
    pub span: Span,
}

/// An at-rule without dedicated modeling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtRule {
    /// Name without `@`, lowercased.
    pub name: String,
    /// Text between the name and the block or semicolon.
    pub prelude: String,
    /// Block contents.
    pub body: AtRuleBody,
    /// Whole rule.
    pub span: Span,
}

/// What an [`AtRule`]'s block holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AtRuleBody {
    /// Statement at-rule such as `@charset "utf-8";`.
    None,
    /// `@font-face { ... }`, `@page { ... }`.
    Declarations(Vec<Declaration>),
    /// `@supports { ... }`, `@keyframes { ... }`.
    Rules(Vec<Rule>),
}

/// `property: value [!important]`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Property name, lowercased.
    pub property: String,
    /// Value terms.
    pub value: Value,
    /// `!important` was present.
    pub important: bool,
    /// From the property name to the end of the value.
    pub span: Span,
}

/// A declaration value: a flat list of terms with nested function arguments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Value {
    /// Terms in source order.
    pub terms: Vec<Term>,
}

impl Value {
    /// Creates a value from terms.
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    /// Returns `true` if there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_terms(f, &self.terms)
    }
}

/// One component of a value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// `url(...)`
    Url(UrlValue),
    /// A keyword such as `no-repeat`.
    Ident(String),
    /// A number with an optional unit (`0`, `10px`).
    Number {
        /// Numeric part.
        value: f64,
        /// Lowercased unit, `None` for plain numbers.
        unit: Option<String>,
    },
    /// `50%`
    Percentage(f64),
    /// `#fff`
    Hash(String),
    /// A quoted string.
    Str(String),
    /// `name(args)`; a bare parenthesized group has an empty name.
    Function {
        /// Function name as written.
        name: String,
        /// Arguments.
        args: Vec<Term>,
    },
    /// `,`
    Comma,
    /// `/`
    Slash,
    /// Any other punctuation.
    Delim(char),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Url(url) => write!(f, "url({url})"),
            Term::Ident(s) => f.write_str(s),
            Term::Number { value, unit } => {
                write!(f, "{value}")?;
                if let Some(unit) = unit {
                    f.write_str(unit)?;
                }
                Ok(())
            }
            Term::Percentage(v) => write!(f, "{v}%"),
            Term::Hash(h) => write!(f, "#{h}"),
            Term::Str(s) => write!(f, "\"{s}\""),
            Term::Function { name, args } => {
                write!(f, "{name}(")?;
                write_terms(f, args)?;
                f.write_str(")")
            }
            Term::Comma => f.write_str(","),
            Term::Slash => f.write_str("/"),
            Term::Delim(c) => write!(f, "{c}"),
        }
    }
}

fn write_terms(f: &mut fmt::Formatter<'_>, terms: &[Term]) -> fmt::Result {
    for (i, term) in terms.iter().enumerate() {
        if i > 0 && !matches!(term, Term::Comma) {
            f.write_str(" ")?;
        }
        write!(f, "{term}")?;
    }
    Ok(())
}

/// The target of a `url(...)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UrlValue {
    /// A concrete path or address.
    Literal(String),
    /// A url containing a `%NAME%` token that is substituted later in the build.
    Placeholder(String),
}

impl UrlValue {
    /// Classifies raw url text.
    pub fn from_raw(raw: &str) -> Self {
        if contains_placeholder(raw) {
            UrlValue::Placeholder(raw.to_string())
        } else {
            UrlValue::Literal(raw.to_string())
        }
    }

    /// The url text as written.
    pub fn as_str(&self) -> &str {
        match self {
            UrlValue::Literal(s) | UrlValue::Placeholder(s) => s,
        }
    }

    /// Returns `true` for [`UrlValue::Placeholder`].
    pub fn is_placeholder(&self) -> bool {
        matches!(self, UrlValue::Placeholder(_))
    }
}

impl fmt::Display for UrlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `%NAME%` where NAME is one or more of `[A-Za-z0-9_.:-]`.
fn contains_placeholder(raw: &str) -> bool {
    let mut rest = raw;
    while let Some(open) = rest.find('%') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('%') else {
            return false;
        };
        let name = &after[..close];
        if !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-'))
        {
            return true;
        }
        rest = after;
    }
    false
}
