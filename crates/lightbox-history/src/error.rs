//! Error types for the history engine.

use crate::graph::Vertex;

/// Errors raised by graph mutation.
///
/// Query misses are values, not errors: an unreachable path is an empty
/// sequence and an unreachable distance is `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Adding the edge would close a cycle. The graph is left unchanged;
    /// this is a contract violation on the caller's side, never repaired
    /// by dropping the edge.
    #[error("edge {from:?} -> {to:?} would close a cycle")]
    CycleDetected {
        /// Requested edge source.
        from: Vertex,
        /// Requested edge target.
        to: Vertex,
    },

    /// The handle does not name a live vertex of this graph — it was
    /// removed, or belongs to another graph instance.
    #[error("stale or foreign vertex handle {0:?}")]
    StaleVertex(Vertex),
}
