//! Structural change notifications.

use super::edge::Connection;

/// Emitted by [`SignalGraph`](super::SignalGraph) after each successful
/// structural edit, when an event sender is attached.
///
/// Events are sent with `try_send`; a full or closed channel drops them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node was inserted.
    NodeAdded(String),
    /// A node was removed together with its edges.
    NodeRemoved(String),
    /// An edge was added.
    ConnectionAdded(Connection),
    /// An edge was removed.
    ConnectionRemoved(Connection),
    /// Every node and edge was dropped.
    Cleared,
}
