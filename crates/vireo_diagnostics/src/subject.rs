//! Design objects a diagnostic can point at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The design object a diagnostic concerns.
///
/// The engine operates on an in-memory netlist rather than source text, so
/// diagnostics are anchored to named design objects instead of file spans.
/// Paths use the hierarchical `instance/port` form.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Subject {
    /// The whole design; used for summaries and global configuration issues.
    Design,
    /// An instance, by path name.
    Instance(String),
    /// A net, by name.
    Net(String),
    /// A pin, by path name (e.g., `u1/Z`).
    Pin(String),
    /// A library cell, by name.
    LibraryCell(String),
}

impl Subject {
    /// Creates an instance subject from any string-like path.
    pub fn instance(path: impl Into<String>) -> Self {
        Subject::Instance(path.into())
    }

    /// Creates a net subject from any string-like name.
    pub fn net(name: impl Into<String>) -> Self {
        Subject::Net(name.into())
    }

    /// Creates a pin subject from any string-like path.
    pub fn pin(path: impl Into<String>) -> Self {
        Subject::Pin(path.into())
    }

    /// Creates a library-cell subject from any string-like name.
    pub fn library_cell(name: impl Into<String>) -> Self {
        Subject::LibraryCell(name.into())
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Design => write!(f, "design"),
            Subject::Instance(p) => write!(f, "instance {p}"),
            Subject::Net(n) => write!(f, "net {n}"),
            Subject::Pin(p) => write!(f, "pin {p}"),
            Subject::LibraryCell(c) => write!(f, "cell {c}"),
        }
    }
}
