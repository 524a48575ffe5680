//! Stable diagnostic codes such as `E101` or `W301`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a diagnostic code, shown as its letter prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `E`: the input cannot be processed as written.
    Error,
    /// `W`: the input is processed but something is probably wrong.
    Warning,
}

impl Category {
    /// Letter shown in front of the number.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A category plus a number, displayed as e.g. `E203`.
///
/// Numbers in the 100s belong to the CSS parser, the 200s to sprite
/// analysis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Category prefix.
    pub category: Category,
    /// Number within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
