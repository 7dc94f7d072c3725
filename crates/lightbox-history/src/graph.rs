//! Generic directed-acyclic-graph container with property storage.
//!
//! # Handles
//!
//! Vertices are addressed through opaque [`Vertex`] handles: a slot index
//! into a [`StableDiGraph`] arena plus a generation stamp. Removing a vertex
//! invalidates its handle — if the arena later reuses the slot, the new
//! occupant carries a fresh stamp, so a stale handle can never be observed
//! to alias a different vertex. Queries through a stale handle return
//! `None`/empty; mutations fail with [`GraphError::StaleVertex`].
//!
//! # Acyclicity
//!
//! [`Graph::add_edge`] checks reachability before inserting and fails with
//! [`GraphError::CycleDetected`] when `to` is already an ancestor of `from`,
//! leaving the graph unchanged. No other operation can introduce a cycle.
//!
//! # Traversal
//!
//! The path and ordering queries ([`Graph::shortest_path`],
//! [`Graph::longest_path_touching`], [`Graph::vertices_depth_first_sorted`],
//! …) are pure: they never mutate the graph. Relatedness queries treat the
//! graph as undirected; depth and ordering queries follow edge direction.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction as PetDirection;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::error::GraphError;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Opaque vertex handle: arena slot plus generation stamp.
///
/// Stable within one graph instance; never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vertex {
    index: u32,
    stamp: u64,
}

/// Direction of an adjacency or traversal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Against edge direction, towards vertices with no incoming edges.
    ToRoot,
    /// Along edge direction, towards vertices with no outgoing edges.
    ToLeaf,
}

impl Direction {
    const fn petgraph(self) -> PetDirection {
        match self {
            Self::ToRoot => PetDirection::Incoming,
            Self::ToLeaf => PetDirection::Outgoing,
        }
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Slot<VP> {
    stamp: u64,
    props: VP,
}

/// DAG with vertex properties `VP` and edge properties `EP`.
#[derive(Debug, Clone)]
pub struct Graph<VP, EP> {
    inner: StableDiGraph<Slot<VP>, EP>,
    next_stamp: u64,
}

impl<VP, EP> Default for Graph<VP, EP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<VP, EP> Graph<VP, EP> {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: StableDiGraph::default(),
            next_stamp: 0,
        }
    }

    /// Number of live vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// `true` if `v` names a live vertex of this graph.
    #[must_use]
    pub fn contains(&self, v: Vertex) -> bool {
        self.resolve(v).is_some()
    }

    /// All live vertices, in handle order.
    #[must_use]
    pub fn vertices(&self) -> Vec<Vertex> {
        self.inner
            .node_indices()
            .map(|idx| self.handle(idx))
            .collect()
    }

    /// All edges as `(from, to)` pairs, in insertion order.
    #[must_use]
    pub fn edges(&self) -> Vec<(Vertex, Vertex)> {
        self.inner
            .edge_indices()
            .filter_map(|e| self.inner.edge_endpoints(e))
            .map(|(from, to)| (self.handle(from), self.handle(to)))
            .collect()
    }

    /// Add a vertex carrying `props`.
    pub fn add_vertex(&mut self, props: VP) -> Vertex {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        let index = self.inner.add_node(Slot { stamp, props });
        Vertex {
            index: u32::try_from(index.index()).unwrap_or(u32::MAX),
            stamp,
        }
    }

    /// Add the edge `from -> to` carrying `props`.
    ///
    /// A duplicate edge is a no-op; the existing properties are kept
    /// (extend them through [`Graph::edge_properties_mut`]).
    ///
    /// # Errors
    ///
    /// [`GraphError::CycleDetected`] when `to` is already an ancestor of
    /// `from` (including `from == to`); [`GraphError::StaleVertex`] when
    /// either handle is dead. The graph is unchanged in both cases.
    pub fn add_edge(&mut self, from: Vertex, to: Vertex, props: EP) -> Result<(), GraphError> {
        let from_idx = self.resolve(from).ok_or(GraphError::StaleVertex(from))?;
        let to_idx = self.resolve(to).ok_or(GraphError::StaleVertex(to))?;

        if from == to {
            return Err(GraphError::CycleDetected { from, to });
        }
        if self.inner.find_edge(from_idx, to_idx).is_some() {
            return Ok(());
        }
        if self.reaches(to_idx, from_idx) {
            return Err(GraphError::CycleDetected { from, to });
        }

        self.inner.add_edge(from_idx, to_idx, props);
        Ok(())
    }

    /// Properties of `v`, or `None` for a stale handle.
    #[must_use]
    pub fn vertex_properties(&self, v: Vertex) -> Option<&VP> {
        self.resolve(v).map(|idx| &self.inner[idx].props)
    }

    /// Mutable properties of `v`.
    pub fn vertex_properties_mut(&mut self, v: Vertex) -> Option<&mut VP> {
        let idx = self.resolve(v)?;
        Some(&mut self.inner[idx].props)
    }

    /// Properties of the edge `from -> to`, if it exists.
    #[must_use]
    pub fn edge_properties(&self, from: Vertex, to: Vertex) -> Option<&EP> {
        let from_idx = self.resolve(from)?;
        let to_idx = self.resolve(to)?;
        let edge = self.inner.find_edge(from_idx, to_idx)?;
        self.inner.edge_weight(edge)
    }

    /// Mutable properties of the edge `from -> to`.
    pub fn edge_properties_mut(&mut self, from: Vertex, to: Vertex) -> Option<&mut EP> {
        let from_idx = self.resolve(from)?;
        let to_idx = self.resolve(to)?;
        let edge = self.inner.find_edge(from_idx, to_idx)?;
        self.inner.edge_weight_mut(edge)
    }

    /// `true` if the edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: Vertex, to: Vertex) -> bool {
        match (self.resolve(from), self.resolve(to)) {
            (Some(f), Some(t)) => self.inner.find_edge(f, t).is_some(),
            _ => false,
        }
    }

    /// Remove `v` and its incident edges, returning its properties.
    ///
    /// Removal cannot create a cycle; the DAG invariant is preserved.
    pub fn remove_vertex(&mut self, v: Vertex) -> Option<VP> {
        let idx = self.resolve(v)?;
        self.inner.remove_node(idx).map(|slot| slot.props)
    }

    /// Neighbors of `v` in `direction`, in edge insertion order.
    #[must_use]
    pub fn adjacent_vertices(&self, v: Vertex, direction: Direction) -> Vec<Vertex> {
        let Some(idx) = self.resolve(v) else {
            return Vec::new();
        };
        // petgraph walks adjacency most-recent-first; reverse for
        // insertion order.
        let mut neighbors: Vec<Vertex> = self
            .inner
            .neighbors_directed(idx, direction.petgraph())
            .map(|n| self.handle(n))
            .collect();
        neighbors.reverse();
        neighbors
    }

    /// `true` if `v` has no incoming edges.
    #[must_use]
    pub fn is_root(&self, v: Vertex) -> bool {
        self.resolve(v).is_some_and(|idx| {
            self.inner
                .neighbors_directed(idx, PetDirection::Incoming)
                .next()
                .is_none()
        })
    }

    /// `true` if `v` has no outgoing edges.
    #[must_use]
    pub fn is_leaf(&self, v: Vertex) -> bool {
        self.resolve(v).is_some_and(|idx| {
            self.inner
                .neighbors_directed(idx, PetDirection::Outgoing)
                .next()
                .is_none()
        })
    }

    // -----------------------------------------------------------------------
    // Traversal queries
    // -----------------------------------------------------------------------

    /// Shortest path between `a` and `b`, edges traversed in either
    /// direction. Includes both endpoints; empty when unreachable or when
    /// either handle is stale.
    #[must_use]
    pub fn shortest_path(&self, a: Vertex, b: Vertex) -> Vec<Vertex> {
        let (Some(start), Some(goal)) = (self.resolve(a), self.resolve(b)) else {
            return Vec::new();
        };
        if start == goal {
            return vec![a];
        }

        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.undirected_neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == goal {
                    return self.unwind_path(start, goal, &parent);
                }
                queue.push_back(next);
            }
        }

        Vec::new()
    }

    /// BFS distances from `root` in the `ToLeaf` direction.
    ///
    /// Every live vertex appears in the map; unreachable vertices map to
    /// `-1`, never omitted. An empty map means `root` is stale.
    #[must_use]
    pub fn shortest_distances_from(&self, root: Vertex) -> HashMap<Vertex, i32> {
        let Some(start) = self.resolve(root) else {
            return HashMap::new();
        };

        let mut distances: HashMap<Vertex, i32> = self
            .inner
            .node_indices()
            .map(|idx| (self.handle(idx), -1))
            .collect();
        distances.insert(root, 0);

        let mut queue: VecDeque<(NodeIndex, i32)> = VecDeque::from([(start, 0)]);
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);

        while let Some((current, depth)) = queue.pop_front() {
            for next in self.inner.neighbors_directed(current, PetDirection::Outgoing) {
                if visited.insert(next) {
                    distances.insert(self.handle(next), depth + 1);
                    queue.push_back((next, depth + 1));
                }
            }
        }

        distances
    }

    /// Vertices reachable from `v` in the `ToLeaf` direction that have no
    /// outgoing edge, in first-visit order. Contains `v` itself when `v`
    /// is a leaf.
    #[must_use]
    pub fn leaves_from(&self, v: Vertex) -> Vec<Vertex> {
        let Some(start) = self.resolve(v) else {
            return Vec::new();
        };

        let mut leaves = Vec::new();
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let mut any_child = false;
            for next in self.insertion_order_neighbors(current, PetDirection::Outgoing) {
                any_child = true;
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
            if !any_child {
                leaves.push(self.handle(current));
            }
        }

        leaves
    }

    /// Longest simple path passing through `reference`.
    ///
    /// Returned root-most first. Among equal-length branches, `tie_break`
    /// compares the candidate vertices' properties and the branch ordering
    /// first wins. Empty when `reference` is stale or has no edges.
    #[must_use]
    pub fn longest_path_touching<F>(&self, reference: Vertex, mut tie_break: F) -> Vec<Vertex>
    where
        F: FnMut(&VP, &VP) -> Ordering,
    {
        let Some(start) = self.resolve(reference) else {
            return Vec::new();
        };
        let isolated = self.undirected_neighbors(start).next().is_none();
        if isolated {
            return Vec::new();
        }

        // Best chain away from the reference in each direction; the
        // reference itself is the first element of both.
        let mut memo = HashMap::new();
        let up = self.best_chain(start, PetDirection::Incoming, &mut tie_break, &mut memo);
        memo.clear();
        let down = self.best_chain(start, PetDirection::Outgoing, &mut tie_break, &mut memo);

        let mut path: Vec<Vertex> = up.iter().skip(1).rev().map(|&idx| self.handle(idx)).collect();
        path.push(reference);
        path.extend(down.iter().skip(1).map(|&idx| self.handle(idx)));
        path
    }

    /// Preorder DFS from `start` in the `ToLeaf` direction; at each branch
    /// the children are visited in `sibling_order` (stable: insertion order
    /// breaks comparator ties). Vertices reachable along several branches
    /// are reported once, on first visit.
    #[must_use]
    pub fn vertices_depth_first_sorted<F>(&self, start: Vertex, mut sibling_order: F) -> Vec<Vertex>
    where
        F: FnMut(&VP, &VP) -> Ordering,
    {
        let Some(root) = self.resolve(start) else {
            return Vec::new();
        };

        let mut order = Vec::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut stack: Vec<NodeIndex> = vec![root];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            order.push(self.handle(current));

            let mut children: Vec<NodeIndex> = self
                .insertion_order_neighbors(current, PetDirection::Outgoing)
                .collect();
            children.sort_by(|&a, &b| sibling_order(&self.inner[a].props, &self.inner[b].props));
            // Reverse so the comparator-first child is popped first.
            for child in children.into_iter().rev() {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }

        order
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn resolve(&self, v: Vertex) -> Option<NodeIndex> {
        let idx = NodeIndex::new(v.index as usize);
        self.inner
            .node_weight(idx)
            .filter(|slot| slot.stamp == v.stamp)
            .map(|_| idx)
    }

    fn handle(&self, idx: NodeIndex) -> Vertex {
        Vertex {
            index: u32::try_from(idx.index()).unwrap_or(u32::MAX),
            stamp: self.inner[idx].stamp,
        }
    }

    /// Directed reachability: can `from` reach `to` along outgoing edges?
    fn reaches(&self, from: NodeIndex, to: NodeIndex) -> bool {
        if from == to {
            return true;
        }
        let mut visited: HashSet<NodeIndex> = HashSet::from([from]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            for next in self.inner.neighbors_directed(current, PetDirection::Outgoing) {
                if next == to {
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    fn undirected_neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner
            .neighbors_directed(idx, PetDirection::Outgoing)
            .chain(self.inner.neighbors_directed(idx, PetDirection::Incoming))
    }

    fn insertion_order_neighbors(
        &self,
        idx: NodeIndex,
        direction: PetDirection,
    ) -> impl Iterator<Item = NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.inner.neighbors_directed(idx, direction).collect();
        neighbors.reverse();
        neighbors.into_iter()
    }

    fn unwind_path(
        &self,
        start: NodeIndex,
        goal: NodeIndex,
        parent: &HashMap<NodeIndex, NodeIndex>,
    ) -> Vec<Vertex> {
        let mut path = vec![self.handle(goal)];
        let mut cursor = goal;
        while cursor != start {
            let Some(&prev) = parent.get(&cursor) else {
                return Vec::new();
            };
            cursor = prev;
            path.push(self.handle(cursor));
        }
        path.reverse();
        path
    }

    /// Longest chain starting at `start` and moving in `direction`,
    /// including `start` as the first element. Equal-length alternatives
    /// are decided by `tie_break` on the immediate next vertices.
    fn best_chain<F>(
        &self,
        start: NodeIndex,
        direction: PetDirection,
        tie_break: &mut F,
        memo: &mut HashMap<NodeIndex, Vec<NodeIndex>>,
    ) -> Vec<NodeIndex>
    where
        F: FnMut(&VP, &VP) -> Ordering,
    {
        if let Some(chain) = memo.get(&start) {
            return chain.clone();
        }

        let mut best: Option<Vec<NodeIndex>> = None;
        for next in self.insertion_order_neighbors(start, direction) {
            let candidate = self.best_chain(next, direction, tie_break, memo);
            let better = match &best {
                None => true,
                Some(current) => match candidate.len().cmp(&current.len()) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => {
                        tie_break(&self.inner[candidate[0]].props, &self.inner[current[0]].props)
                            == Ordering::Less
                    }
                },
            };
            if better {
                best = Some(candidate);
            }
        }

        let mut chain = vec![start];
        chain.extend(best.unwrap_or_default());
        memo.insert(start, chain.clone());
        chain
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
