//! Display contract for presentation layers.
//!
//! A tree view, list model, or exporter implements [`HistoryProjection`]
//! and receives one depth-first pass over the graph. The walk starts at the
//! root of the subject's main line, visits vertices oldest-sibling-first,
//! and reports each edge's actions right before the vertex they lead to —
//! the order a user reads an edit history in.
//!
//! This is deliberately thin; layout and widgets live entirely on the
//! consumer's side.

use crate::action::FilterAction;
use crate::graph::{Direction, Vertex};
use crate::history::HistoryGraph;
use crate::item::{ItemInfo, Roles};

/// Receiver for one presentation pass over a [`HistoryGraph`].
pub trait HistoryProjection {
    /// The pass begins at `root`, the root of the subject's main line.
    fn begin_lineage(&mut self, root: Vertex) {
        let _ = root;
    }

    /// A vertex, with its member infos and derived category set.
    fn visit_vertex(&mut self, vertex: Vertex, infos: &[ItemInfo], categories: Roles);

    /// The actions on the edge `from -> to`, reported before `to` is visited.
    fn visit_actions(&mut self, from: Vertex, to: Vertex, actions: &[FilterAction]) {
        let _ = (from, to, actions);
    }

    /// The pass is complete.
    fn end_lineage(&mut self) {}
}

/// Drive one pass over `graph` for `subject`, feeding `sink`.
///
/// No-op when `subject` has no vertex in the graph; run
/// [`HistoryGraph::prepare_for_display`] first when the subject might be
/// missing.
pub fn project(graph: &HistoryGraph, subject: &ItemInfo, sink: &mut dyn HistoryProjection) {
    let Some(reference) = graph.find_vertex(subject) else {
        return;
    };

    let line = graph.main_line(reference);
    let root = line.first().copied().unwrap_or(reference);
    let categories = graph.categorize();

    sink.begin_lineage(root);
    let mut previous: Option<Vertex> = None;
    for vertex in graph.depth_first_sorted(root) {
        if let Some(prev) = previous {
            if let Some(edge) = graph.graph().edge_properties(prev, vertex) {
                sink.visit_actions(prev, vertex, &edge.actions);
            } else if let Some(parent) = graph
                .graph()
                .adjacent_vertices(vertex, Direction::ToRoot)
                .first()
                .copied()
            {
                // Branch switch: the depth-first predecessor is not the
                // graph parent; report the actions from the actual parent.
                if let Some(edge) = graph.graph().edge_properties(parent, vertex) {
                    sink.visit_actions(parent, vertex, &edge.actions);
                }
            }
        }
        if let Some(props) = graph.graph().vertex_properties(vertex) {
            let roles = categories.get(&vertex).copied().unwrap_or_default();
            sink.visit_vertex(vertex, props.infos(), roles);
        }
        previous = Some(vertex);
    }
    sink.end_lineage();
}
