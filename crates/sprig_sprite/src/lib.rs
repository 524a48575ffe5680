//! Sprite candidate analysis for parsed style sheets.
//!
//! [`scan`] runs the [`ImageAssemblyScanVisitor`] over a
//! [`StyleSheet`](sprig_css::StyleSheet) and returns the [`ScanOutput`]: the
//! de-duplicated, order-stable list of background images that can be packed
//! into a sprite, plus every occurrence of each image. Inconsistent use of
//! an image across rule sets, or a rule set the sprite builder could not
//! reproduce, is reported as a [`ScanError`].

#![warn(missing_docs)]

pub mod analysis;
pub mod error;
pub mod output;
pub mod position;
pub mod resolve;
pub mod visitor;

pub use analysis::{AnalysisEntry, AnalysisLog, ImageOutcome};
pub use error::ScanError;
pub use output::{ImageFormat, ImageReference, RuleOrigin, ScanOutput};
pub use position::{BackgroundRepeat, ImagePosition, PositionKeyword, PositionValue};
pub use resolve::{ScanSettings, UrlResolver};
pub use visitor::{scan, ImageAssemblyScanVisitor, ScanResult};
