//! Edge types.
//!
//! Internally an edge is a triple of node slots plus the destination input
//! index. [`Connection`] is the id-based view handed to callers.

use core::fmt;

/// A directed connection between two node slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Edge {
    /// Source slot.
    pub from: usize,
    /// Destination slot.
    pub to: usize,
    /// Destination input index.
    pub input: usize,
}

/// Edge description keyed by node ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Producing node.
    pub source: String,
    /// Consuming node.
    pub dest: String,
    /// Input index on `dest`.
    pub input: usize,
}

impl Connection {
    /// Build a connection description.
    pub fn new(source: impl Into<String>, dest: impl Into<String>, input: usize) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            input,
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}[{}]", self.source, self.dest, self.input)
    }
}
