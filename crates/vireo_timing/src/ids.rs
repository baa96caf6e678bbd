//! Opaque ID newtype for timing graph vertices.

use serde::{Deserialize, Serialize};

/// Opaque, copyable ID for a vertex in the timing graph.
///
/// Vertices are pin-resolution: vertex `i` corresponds to pin `i` of the
/// design, so the raw index doubles as a pin index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct VertexId(u32);

impl VertexId {
    /// Creates an ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
