//! `background-position` and `background-repeat` values.

use serde::{Deserialize, Serialize};
use sprig_css::Term;
use std::fmt;

/// Position keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionKeyword {
    /// `left`
    Left,
    /// `right`
    Right,
    /// `top`
    Top,
    /// `bottom`
    Bottom,
    /// `center`
    Center,
}

impl PositionKeyword {
    /// Parses a keyword, ignoring ASCII case.
    pub fn parse(word: &str) -> Option<Self> {
        Some(match word.to_ascii_lowercase().as_str() {
            "left" => PositionKeyword::Left,
            "right" => PositionKeyword::Right,
            "top" => PositionKeyword::Top,
            "bottom" => PositionKeyword::Bottom,
            "center" => PositionKeyword::Center,
            _ => return None,
        })
    }

    fn is_vertical(self) -> bool {
        matches!(self, PositionKeyword::Top | PositionKeyword::Bottom)
    }

    fn is_horizontal(self) -> bool {
        matches!(self, PositionKeyword::Left | PositionKeyword::Right)
    }

    fn as_str(self) -> &'static str {
        match self {
            PositionKeyword::Left => "left",
            PositionKeyword::Right => "right",
            PositionKeyword::Top => "top",
            PositionKeyword::Bottom => "bottom",
            PositionKeyword::Center => "center",
        }
    }
}

/// One axis of a background position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PositionValue {
    /// A keyword.
    Keyword(PositionKeyword),
    /// A length; zero is always stored without a unit.
    Length {
        /// Magnitude.
        value: f64,
        /// Lowercased unit.
        unit: Option<String>,
    },
    /// A percentage.
    Percentage(f64),
}

impl PositionValue {
    /// Converts a value term into a position component, if it is one.
    pub fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::Ident(word) => PositionKeyword::parse(word).map(PositionValue::Keyword),
            Term::Number { value, unit } => Some(PositionValue::Length {
                value: *value,
                unit: if *value == 0.0 { None } else { unit.clone() },
            }),
            Term::Percentage(v) => Some(PositionValue::Percentage(*v)),
            _ => None,
        }
    }

    fn keyword(&self) -> Option<PositionKeyword> {
        match self {
            PositionValue::Keyword(k) => Some(*k),
            _ => None,
        }
    }
}

impl fmt::Display for PositionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionValue::Keyword(k) => f.write_str(k.as_str()),
            PositionValue::Length { value, unit } => {
                write!(f, "{value}{}", unit.as_deref().unwrap_or(""))
            }
            PositionValue::Percentage(v) => write!(f, "{v}%"),
        }
    }
}

/// Effective background position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagePosition {
    /// Horizontal component.
    pub x: PositionValue,
    /// Vertical component.
    pub y: PositionValue,
}

impl ImagePosition {
    /// Builds a position from at most two components; `None` for zero or
    /// more than two.
    ///
    /// A single component sets the horizontal axis, or the vertical one for
    /// `top`/`bottom`, and the other axis is `center`. Two components are
    /// `x y` unless the keywords say otherwise (`top left`).
    pub fn from_components(components: &[PositionValue]) -> Option<Self> {
        let center = PositionValue::Keyword(PositionKeyword::Center);
        match components {
            [only] => {
                if only.keyword().is_some_and(PositionKeyword::is_vertical) {
                    Some(Self {
                        x: center,
                        y: only.clone(),
                    })
                } else {
                    Some(Self {
                        x: only.clone(),
                        y: center,
                    })
                }
            }
            [a, b] => {
                let swapped = a.keyword().is_some_and(PositionKeyword::is_vertical)
                    || b.keyword().is_some_and(PositionKeyword::is_horizontal);
                if swapped {
                    Some(Self {
                        x: b.clone(),
                        y: a.clone(),
                    })
                } else {
                    Some(Self {
                        x: a.clone(),
                        y: b.clone(),
                    })
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for ImagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Effective background repeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackgroundRepeat {
    /// `repeat`
    Repeat,
    /// `no-repeat`
    NoRepeat,
    /// `repeat-x`, or `repeat no-repeat`
    RepeatX,
    /// `repeat-y`, or `no-repeat repeat`
    RepeatY,
    /// `space`
    Space,
    /// `round`
    Round,
}

impl BackgroundRepeat {
    /// Parses a single repeat keyword, ignoring ASCII case.
    pub fn parse(word: &str) -> Option<Self> {
        Some(match word.to_ascii_lowercase().as_str() {
            "repeat" => BackgroundRepeat::Repeat,
            "no-repeat" => BackgroundRepeat::NoRepeat,
            "repeat-x" => BackgroundRepeat::RepeatX,
            "repeat-y" => BackgroundRepeat::RepeatY,
            "space" => BackgroundRepeat::Space,
            "round" => BackgroundRepeat::Round,
            _ => return None,
        })
    }

    /// Reads the repeat keywords out of a value; two-keyword forms are folded
    /// into their single-keyword equivalent.
    pub fn from_terms(terms: &[Term]) -> Option<Self> {
        let mut words = terms.iter().filter_map(|t| match t {
            Term::Ident(w) => BackgroundRepeat::parse(w),
            _ => None,
        });
        let first = words.next()?;
        Some(match (first, words.next()) {
            (BackgroundRepeat::Repeat, Some(BackgroundRepeat::NoRepeat)) => BackgroundRepeat::RepeatX,
            (BackgroundRepeat::NoRepeat, Some(BackgroundRepeat::Repeat)) => BackgroundRepeat::RepeatY,
            (first, _) => first,
        })
    }
}

/// Position components of a value, stopping at a `/` (the size part of the
/// `background` shorthand) or at the first `,` (later layers).
pub fn position_components(terms: &[Term]) -> Vec<PositionValue> {
    terms
        .iter()
        .take_while(|t| !matches!(t, Term::Slash | Term::Comma))
        .filter_map(PositionValue::from_term)
        .collect()
}
