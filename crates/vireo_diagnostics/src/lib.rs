//! Structured diagnostics for the Vireo physical-synthesis engine.
//!
//! The engine never prints directly; every warning, note, and error is a
//! [`Diagnostic`] emitted into a [`DiagnosticSink`]. A diagnostic carries a
//! severity, a category-prefixed code, a message, and the design object it
//! concerns (an instance, net, pin, or library cell).

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;
pub mod subject;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
pub use subject::Subject;
