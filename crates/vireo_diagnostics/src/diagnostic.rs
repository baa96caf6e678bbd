//! Structured diagnostic messages with severity, codes, and subjects.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use crate::subject::Subject;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message anchored to a design object.
///
/// Diagnostics are the engine's only reporting mechanism. Each diagnostic
/// includes a severity level, a unique code, a primary message, the design
/// object it concerns, and optional explanatory notes and help text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unique code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// The design object this diagnostic concerns.
    pub subject: Subject,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic with the given code, message, and subject.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, subject: Subject) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            subject,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new warning diagnostic with the given code, message, and subject.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, subject: Subject) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            subject,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new note diagnostic with the given code, message, and subject.
    pub fn note(code: DiagnosticCode, message: impl Into<String>, subject: Subject) -> Self {
        Self {
            severity: Severity::Note,
            code,
            message: message.into(),
            subject,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}
