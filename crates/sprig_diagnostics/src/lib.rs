//! User-facing diagnostics for style-sheet parsing and sprite analysis.
//!
//! A [`Diagnostic`] carries a [`Severity`], a stable [`DiagnosticCode`], a
//! message and the [`Span`](sprig_source::Span) of the offending rule.
//! Parsers and scanners push them into a thread-safe [`DiagnosticSink`];
//! the CLI prints them with the [`TerminalRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
