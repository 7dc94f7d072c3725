//! The edit-history graph: the domain specialization over [`Graph`].
//!
//! # Model
//!
//! Each vertex stands for one distinct pixel-content state and carries the
//! ordered, non-empty set of [`ItemInfo`]s whose files share that content.
//! Each edge `A -> B` carries the ordered filter actions that produced `B`
//! from `A`.
//!
//! # Invariants
//!
//! - The edge set is a DAG ([`Graph::add_edge`] enforces this).
//! - Every `ItemInfo` id belongs to exactly one vertex across the whole
//!   graph — content identity is a partition, not a multi-membership.
//!
//! # Lifecycle
//!
//! A graph is built when a file is opened ([`HistoryGraph::from_info`],
//! [`HistoryGraph::add_history`]), extended as filters are applied, trimmed
//! once for presentation ([`HistoryGraph::prepare_for_display`] — the one
//! mutating entry point after construction), and discarded when the session
//! ends.

use std::collections::{HashMap, HashSet};

use crate::action::FilterAction;
use crate::error::GraphError;
use crate::graph::{Direction, Graph, Vertex};
use crate::item::{ItemInfo, Roles};
use crate::timeline::EditHistory;

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Ordered, non-empty set of infos sharing one pixel-content state.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexProperties {
    infos: Vec<ItemInfo>,
}

impl VertexProperties {
    /// Properties holding a single info.
    #[must_use]
    pub fn new(info: ItemInfo) -> Self {
        Self { infos: vec![info] }
    }

    /// All member infos, in the order they were attached.
    #[must_use]
    pub fn infos(&self) -> &[ItemInfo] {
        &self.infos
    }

    /// The first attached info. The set is never empty.
    #[must_use]
    pub fn first_info(&self) -> &ItemInfo {
        &self.infos[0]
    }

    /// `true` if an info with this database id is a member.
    #[must_use]
    pub fn contains_id(&self, id: i64) -> bool {
        self.infos.iter().any(|info| info.id == id)
    }

    /// `true` if any member belongs to this content group.
    #[must_use]
    pub fn shares_content_group(&self, group: &str) -> bool {
        self.infos.iter().any(|info| info.content_group == group)
    }

    /// Union of the role tags carried by the members.
    #[must_use]
    pub fn roles(&self) -> Roles {
        self.infos
            .iter()
            .fold(Roles::empty(), |acc, info| acc | info.roles)
    }

    fn attach(&mut self, info: ItemInfo) {
        if !self.contains_id(info.id) {
            self.infos.push(info);
        }
    }
}

/// Ordered actions applied along one edge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeProperties {
    /// The action sequence, in application order.
    pub actions: Vec<FilterAction>,
}

impl EdgeProperties {
    /// Properties carrying the given action sequence.
    #[must_use]
    pub fn new(actions: Vec<FilterAction>) -> Self {
        Self { actions }
    }
}

// ---------------------------------------------------------------------------
// HistoryGraph
// ---------------------------------------------------------------------------

/// The edit-history DAG for one lineage of files.
#[derive(Debug, Clone, Default)]
pub struct HistoryGraph {
    graph: Graph<VertexProperties, EdgeProperties>,
}

impl HistoryGraph {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A trivial single-vertex graph holding only `subject`.
    #[must_use]
    pub fn from_info(subject: ItemInfo) -> Self {
        let mut graph = Self::new();
        graph.graph.add_vertex(VertexProperties::new(subject));
        graph
    }

    /// The read-only query surface of the underlying DAG.
    #[must_use]
    pub fn graph(&self) -> &Graph<VertexProperties, EdgeProperties> {
        &self.graph
    }

    /// Fold a linear history into the graph.
    ///
    /// Every entry that refers to at least one file becomes (or joins) a
    /// vertex; consecutive referred states are chained with an edge carrying
    /// the actions accumulated between them. Entries with an action but no
    /// referred file contribute their action to the next edge. Returns the
    /// vertex of the last referred state, if any.
    ///
    /// # Errors
    ///
    /// [`GraphError::CycleDetected`] if the history revisits an ancestor
    /// state — a malformed input this subsystem refuses to absorb.
    pub fn add_history(&mut self, history: &EditHistory) -> Result<Option<Vertex>, GraphError> {
        let mut pending: Vec<FilterAction> = Vec::new();
        let mut last: Option<Vertex> = None;

        for entry in history.entries() {
            if let Some(action) = &entry.action {
                pending.push(action.clone());
            }
            if entry.referred.is_empty() {
                continue;
            }

            let vertex = self.find_or_create(&entry.referred);
            match last {
                Some(prev) if prev != vertex => {
                    let actions = std::mem::take(&mut pending);
                    // A transition the graph already knows keeps its
                    // recorded actions.
                    if !self.graph.has_edge(prev, vertex) {
                        self.graph.add_edge(prev, vertex, EdgeProperties::new(actions))?;
                    }
                }
                _ => pending.clear(),
            }
            last = Some(vertex);
        }

        Ok(last)
    }

    /// The vertex whose member set contains `info`, by exact id match.
    #[must_use]
    pub fn find_vertex(&self, info: &ItemInfo) -> Option<Vertex> {
        self.graph.vertices().into_iter().find(|&v| {
            self.graph
                .vertex_properties(v)
                .is_some_and(|props| props.contains_id(info.id))
        })
    }

    /// Category set per vertex: the union of the role tags its member infos
    /// carry. Pure — role tags are supplied by the editing session, never
    /// inferred from topology; re-running without mutation yields identical
    /// results.
    #[must_use]
    pub fn categorize(&self) -> HashMap<Vertex, Roles> {
        self.graph
            .vertices()
            .into_iter()
            .filter_map(|v| {
                self.graph
                    .vertex_properties(v)
                    .map(|props| (v, props.roles()))
            })
            .collect()
    }

    /// Reduce the graph to what is relevant for displaying `subject`:
    /// ensure `subject` has a vertex (inserting a trivial one if absent),
    /// then drop every vertex outside its connected component. The one
    /// mutating entry point after construction; DAG and partition
    /// invariants hold afterwards. Returns the subject's vertex.
    pub fn prepare_for_display(&mut self, subject: &ItemInfo) -> Vertex {
        let vertex = self.find_vertex(subject).unwrap_or_else(|| {
            self.graph.add_vertex(VertexProperties::new(subject.clone()))
        });

        let mut keep: HashSet<Vertex> = HashSet::from([vertex]);
        let mut stack = vec![vertex];
        while let Some(current) = stack.pop() {
            let parents = self.graph.adjacent_vertices(current, Direction::ToRoot);
            let children = self.graph.adjacent_vertices(current, Direction::ToLeaf);
            for next in parents.into_iter().chain(children) {
                if keep.insert(next) {
                    stack.push(next);
                }
            }
        }

        let mut dropped = 0usize;
        for v in self.graph.vertices() {
            if !keep.contains(&v) {
                self.graph.remove_vertex(v);
                dropped += 1;
            }
        }
        tracing::debug!(
            kept = keep.len(),
            dropped,
            "reduced graph to the subject's component"
        );

        vertex
    }

    /// The main line of the lineage: the longest path through `reference`,
    /// newest-first among equal branches (compared on each vertex's first
    /// info timestamp, then id for stability).
    #[must_use]
    pub fn main_line(&self, reference: Vertex) -> Vec<Vertex> {
        self.graph.longest_path_touching(reference, |a, b| {
            let (a, b) = (a.first_info(), b.first_info());
            b.modified.cmp(&a.modified).then(a.id.cmp(&b.id))
        })
    }

    /// Depth-first display order from `start`, oldest sibling first.
    #[must_use]
    pub fn depth_first_sorted(&self, start: Vertex) -> Vec<Vertex> {
        self.graph.vertices_depth_first_sorted(start, |a, b| {
            let (a, b) = (a.first_info(), b.first_info());
            a.modified.cmp(&b.modified).then(a.id.cmp(&b.id))
        })
    }

    /// Content fingerprint of the graph: a `blake3:`-prefixed hash over the
    /// sorted vertex membership and edge set. Changes exactly when the
    /// recorded structure changes; callers use it for cache invalidation.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        for v in self.graph.vertices() {
            if let Some(props) = self.graph.vertex_properties(v) {
                let mut ids: Vec<i64> = props.infos().iter().map(|i| i.id).collect();
                ids.sort_unstable();
                let ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
                lines.push(format!("v:{}", ids.join(",")));
            }
        }
        for (from, to) in self.graph.edges() {
            let key = |v: Vertex| {
                self.graph
                    .vertex_properties(v)
                    .map(|p| p.infos().iter().map(|i| i.id).min().unwrap_or(i64::MAX))
                    .unwrap_or(i64::MAX)
            };
            let actions: Vec<String> = self
                .graph
                .edge_properties(from, to)
                .map(|e| e.actions.iter().map(|a| a.identifier.clone()).collect())
                .unwrap_or_default();
            lines.push(format!("e:{}>{}:{}", key(from), key(to), actions.join(",")));
        }

        lines.sort_unstable();
        let mut hasher = blake3::Hasher::new();
        for line in &lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        format!("blake3:{}", hasher.finalize().to_hex())
    }

    /// Find the vertex any of `infos` already belongs to — by id, then by
    /// content group — or create a fresh one. Missing infos are attached to
    /// the chosen vertex, preserving the one-vertex-per-info partition.
    fn find_or_create(&mut self, infos: &[ItemInfo]) -> Vertex {
        let existing = self.graph.vertices().into_iter().find(|&v| {
            self.graph.vertex_properties(v).is_some_and(|props| {
                infos.iter().any(|info| {
                    props.contains_id(info.id) || props.shares_content_group(&info.content_group)
                })
            })
        });

        match existing {
            Some(v) => {
                if let Some(props) = self.graph.vertex_properties_mut(v) {
                    for info in infos {
                        props.attach(info.clone());
                    }
                }
                v
            }
            None => {
                // Callers only pass non-empty referred sets.
                let mut props = VertexProperties::new(infos[0].clone());
                for info in &infos[1..] {
                    props.attach(info.clone());
                }
                self.graph.add_vertex(props)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{FilterAction, FilterCategory};
    use chrono::{TimeZone, Utc};

    fn info(id: i64, minute: u32, roles: Roles) -> ItemInfo {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 12, minute, 0).single().expect("valid ts");
        ItemInfo::new(id, ts, format!("grp-{id}")).with_roles(roles)
    }

    fn action(id: &str) -> FilterAction {
        FilterAction::new(id, 1, FilterCategory::Reproducible)
    }

    /// raw original -> developed intermediate -> current result,
    /// with one unsaved step in between.
    fn session_history() -> EditHistory {
        let mut history = EditHistory::new();
        history.push_start(info(1, 0, Roles::ORIGINAL));
        history.push_action(action("raw:develop"));
        history.push_referred(info(2, 10, Roles::INTERMEDIATE));
        history.push_action(action("bcg:adjust"));
        history.push_action(action("crop:apply"));
        history.push_referred(info(3, 20, Roles::CURRENT));
        history
    }

    #[test]
    fn from_info_builds_trivial_graph() {
        let graph = HistoryGraph::from_info(info(1, 0, Roles::CURRENT));
        assert_eq!(graph.graph().vertex_count(), 1);
        assert_eq!(graph.graph().edge_count(), 0);
        let v = graph.find_vertex(&info(1, 0, Roles::CURRENT)).expect("subject vertex");
        assert!(graph.graph().is_root(v));
    }

    #[test]
    fn add_history_chains_referred_states() {
        let mut graph = HistoryGraph::new();
        let last = graph.add_history(&session_history()).expect("acyclic");

        assert_eq!(graph.graph().vertex_count(), 3);
        assert_eq!(graph.graph().edge_count(), 2);

        let current = graph.find_vertex(&info(3, 20, Roles::CURRENT)).expect("current");
        assert_eq!(last, Some(current));
        assert!(graph.graph().is_leaf(current));

        // The unsaved steps travel on the edge into the current state.
        let intermediate = graph.find_vertex(&info(2, 10, Roles::INTERMEDIATE)).expect("mid");
        let edge = graph
            .graph()
            .edge_properties(intermediate, current)
            .expect("edge");
        let ids: Vec<&str> = edge.actions.iter().map(|a| a.identifier.as_str()).collect();
        assert_eq!(ids, vec!["bcg:adjust", "crop:apply"]);
    }

    #[test]
    fn infos_with_shared_content_join_one_vertex() {
        let mut graph = HistoryGraph::new();
        graph.add_history(&session_history()).expect("acyclic");

        // A later history refers to the same file ids; nothing is duplicated.
        graph.add_history(&session_history()).expect("acyclic");
        assert_eq!(graph.graph().vertex_count(), 3);
        assert_eq!(graph.graph().edge_count(), 2);

        // An exported copy of the current state (same content group,
        // different file id) joins the current vertex.
        let mut copy = info(9, 30, Roles::empty());
        copy.content_group = "grp-3".into();
        let mut history = EditHistory::new();
        history.push_start(copy.clone());
        graph.add_history(&history).expect("acyclic");

        assert_eq!(graph.graph().vertex_count(), 3);
        let v = graph.find_vertex(&copy).expect("joined vertex");
        assert_eq!(v, graph.find_vertex(&info(3, 20, Roles::CURRENT)).expect("current"));
    }

    #[test]
    fn categorize_unions_member_roles() {
        let mut graph = HistoryGraph::new();
        graph.add_history(&session_history()).expect("acyclic");

        let categories = graph.categorize();
        let original = graph.find_vertex(&info(1, 0, Roles::ORIGINAL)).expect("original");
        let current = graph.find_vertex(&info(3, 20, Roles::CURRENT)).expect("current");

        assert_eq!(categories[&original], Roles::ORIGINAL);
        assert_eq!(categories[&current], Roles::CURRENT);
        assert_eq!(categories.len(), 3);
    }

    #[test]
    fn categorize_is_repeatable() {
        let mut graph = HistoryGraph::new();
        graph.add_history(&session_history()).expect("acyclic");
        assert_eq!(graph.categorize(), graph.categorize());
    }

    #[test]
    fn find_vertex_misses_unknown_info() {
        let graph = HistoryGraph::from_info(info(1, 0, Roles::CURRENT));
        assert_eq!(graph.find_vertex(&info(42, 0, Roles::empty())), None);
    }

    #[test]
    fn prepare_for_display_drops_unrelated_lineage() {
        let mut graph = HistoryGraph::new();
        graph.add_history(&session_history()).expect("acyclic");

        // A second, disconnected lineage.
        let mut other = EditHistory::new();
        other.push_start(info(7, 0, Roles::ORIGINAL));
        other.push_action(action("bcg:adjust"));
        other.push_referred(info(8, 5, Roles::CURRENT));
        graph.add_history(&other).expect("acyclic");
        assert_eq!(graph.graph().vertex_count(), 5);

        let subject = info(3, 20, Roles::CURRENT);
        let v = graph.prepare_for_display(&subject);

        assert_eq!(graph.graph().vertex_count(), 3);
        assert_eq!(graph.find_vertex(&subject), Some(v));
        assert_eq!(graph.find_vertex(&info(7, 0, Roles::ORIGINAL)), None);
        assert_eq!(graph.find_vertex(&info(8, 5, Roles::CURRENT)), None);
    }

    #[test]
    fn prepare_for_display_inserts_missing_subject() {
        let mut graph = HistoryGraph::new();
        let subject = info(11, 0, Roles::CURRENT);
        let v = graph.prepare_for_display(&subject);
        assert_eq!(graph.graph().vertex_count(), 1);
        assert_eq!(graph.find_vertex(&subject), Some(v));
    }

    #[test]
    fn main_line_prefers_newest_branch() {
        let mut graph = HistoryGraph::new();
        graph.add_history(&session_history()).expect("acyclic");

        // Fork a second result off the intermediate, newer than the first.
        let mut fork = EditHistory::new();
        fork.push_start(info(2, 10, Roles::INTERMEDIATE));
        fork.push_action(action("vignette:apply"));
        fork.push_referred(info(4, 40, Roles::CURRENT));
        graph.add_history(&fork).expect("acyclic");

        let original = graph.find_vertex(&info(1, 0, Roles::ORIGINAL)).expect("original");
        let line = graph.main_line(original);
        let last = *line.last().expect("non-empty main line");
        assert_eq!(
            graph.find_vertex(&info(4, 40, Roles::CURRENT)),
            Some(last),
            "newest-first tie break picks the later fork"
        );
        assert!(line.contains(&original));
        assert_eq!(line.len(), 3);
    }

    #[test]
    fn fingerprint_tracks_structure() {
        let mut graph = HistoryGraph::new();
        graph.add_history(&session_history()).expect("acyclic");
        let before = graph.fingerprint();
        assert!(before.starts_with("blake3:"));

        // Same structure, same fingerprint.
        assert_eq!(before, graph.fingerprint());

        // New edge changes it.
        let mut fork = EditHistory::new();
        fork.push_start(info(2, 10, Roles::INTERMEDIATE));
        fork.push_action(action("vignette:apply"));
        fork.push_referred(info(4, 40, Roles::CURRENT));
        graph.add_history(&fork).expect("acyclic");
        assert_ne!(before, graph.fingerprint());
    }

    #[test]
    fn add_history_rejects_revisiting_an_ancestor() {
        let mut graph = HistoryGraph::new();
        graph.add_history(&session_history()).expect("acyclic");

        // A malformed history claiming the original came from the result.
        let mut bad = EditHistory::new();
        bad.push_start(info(3, 20, Roles::CURRENT));
        bad.push_action(action("time:travel"));
        bad.push_referred(info(1, 0, Roles::ORIGINAL));

        let err = graph.add_history(&bad).expect_err("cycle must be refused");
        assert!(matches!(err, GraphError::CycleDetected { .. }));
        // Unchanged.
        assert_eq!(graph.graph().edge_count(), 2);
    }
}
