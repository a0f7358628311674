//! # Graph Index
//!
//! `KnowledgeGraph` is the in-memory store for nodes, edges and embeddings.
//! It is the only owner of graph state: fields are private and mutation goes
//! through [`KnowledgeGraph::add_node`], [`KnowledgeGraph::add_edge`] and
//! [`KnowledgeGraph::clear`], which enforce the structural invariants:
//!
//! - node ids are unique
//! - embeddings, resonance and timestamps are finite
//! - every edge endpoint exists (no dangling edges)
//! - at most one edge per unordered pair, never a self-loop
//! - all embeddings share one dimension, fixed by the first node
//!
//! Adjacency lists are kept sorted by node id so every traversal visits
//! neighbours in a reproducible order.

pub mod stats;

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::config::DuplicateEdgePolicy;
use crate::model::*;
use crate::{Error, Result};

pub use stats::GraphStats;

type Adjacency = SmallVec<[NodeId; 8]>;

// ============================================================================
// KnowledgeGraph
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeKey, f32>,
    /// node id → neighbour ids, ascending
    adjacency: HashMap<NodeId, Adjacency>,
    dimension: Option<usize>,
    policy: DuplicateEdgePolicy,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicateEdgePolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    pub fn policy(&self) -> DuplicateEdgePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: DuplicateEdgePolicy) {
        self.policy = policy;
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert a node. Fails on a duplicate id, a non-finite value, or an
    /// embedding whose length differs from the graph's dimension.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(Error::DuplicateId(node.id));
        }
        if !node.resonance.is_finite()
            || !node.timestamp.is_finite()
            || node.embedding.iter().any(|x| !x.is_finite())
        {
            return Err(Error::NonFiniteNode(node.id));
        }
        match self.dimension {
            Some(expected) if expected != node.embedding.len() => {
                return Err(Error::DimensionMismatch {
                    expected,
                    got: node.embedding.len(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(node.embedding.len()),
        }

        self.adjacency.insert(node.id, Adjacency::new());
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Connect two nodes. A second edge for the same pair follows the
    /// graph's [`DuplicateEdgePolicy`].
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: f32) -> Result<EdgeInsert> {
        if !self.nodes.contains_key(&a) {
            return Err(Error::UnknownNode(a));
        }
        if !self.nodes.contains_key(&b) {
            return Err(Error::UnknownNode(b));
        }
        if a == b {
            return Err(Error::SelfLoop(a));
        }
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(Error::InvalidWeight(weight));
        }

        let key = EdgeKey::new(a, b);
        if let Some(existing) = self.edges.get_mut(&key) {
            return match self.policy {
                DuplicateEdgePolicy::Update => {
                    let previous = std::mem::replace(existing, weight);
                    Ok(EdgeInsert::Updated { previous })
                }
                DuplicateEdgePolicy::Reject => Err(Error::DuplicateEdge(key.lo(), key.hi())),
            };
        }

        self.edges.insert(key, weight);
        for (from, to) in [(a, b), (b, a)] {
            let list = self.adjacency.entry(from).or_default();
            let pos = list.binary_search(&to).unwrap_or_else(|p| p);
            list.insert(pos, to);
        }
        Ok(EdgeInsert::Created)
    }

    /// Drop every node and edge. The dimension is forgotten too.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.adjacency.clear();
        self.dimension = None;
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Embedding dimension, once the first node has been added.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Smallest id above every existing id; `0` for an empty graph.
    pub fn next_id(&self) -> NodeId {
        self.nodes.keys().map(|id| id.0 + 1).max().map_or(NodeId(0), NodeId)
    }

    /// All node ids, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All nodes, ascending by id.
    pub fn nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_unstable_by_key(|n| n.id);
        nodes
    }

    /// All edges with `source < target`, ascending by pair.
    pub fn edges(&self) -> Vec<Edge> {
        let mut keys: Vec<(&EdgeKey, &f32)> = self.edges.iter().collect();
        keys.sort_unstable_by_key(|(k, _)| **k);
        keys.into_iter()
            .map(|(k, w)| Edge::new(k.lo(), k.hi(), *w))
            .collect()
    }

    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<f32> {
        self.edges.get(&EdgeKey::new(a, b)).copied()
    }

    /// Direct neighbours, ascending. Empty for an unknown id.
    pub fn adjacent(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(&id).map(|list| list.as_slice()).unwrap_or(&[])
    }

    /// Number of incident edges.
    pub fn degree(&self, id: NodeId) -> Result<usize> {
        self.adjacency
            .get(&id)
            .map(|list| list.len())
            .ok_or(Error::UnknownNode(id))
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Ids reachable from `id` within `max_depth` hops (breadth-first),
    /// excluding `id` itself. Sorted ascending.
    pub fn neighbors(&self, id: NodeId, max_depth: usize) -> Result<Vec<NodeId>> {
        if !self.contains(id) {
            return Err(Error::UnknownNode(id));
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(id);
        let mut queue = VecDeque::from([(id, 0usize)]);
        let mut reached = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for &next in self.adjacent(current) {
                if visited.insert(next) {
                    reached.push(next);
                    queue.push_back((next, depth + 1));
                }
            }
        }

        reached.sort_unstable();
        Ok(reached)
    }

    /// The induced subgraph on `ids`: those nodes and every edge between
    /// them. Unknown ids fail; repeated ids are ignored.
    pub fn subgraph(&self, ids: &[NodeId]) -> Result<KnowledgeGraph> {
        let mut sub = KnowledgeGraph::with_policy(self.policy);
        let mut wanted: Vec<NodeId> = ids.to_vec();
        wanted.sort_unstable();
        wanted.dedup();

        for id in &wanted {
            let node = self.nodes.get(id).ok_or(Error::UnknownNode(*id))?;
            sub.add_node(node.clone())?;
        }
        for id in &wanted {
            for &other in self.adjacent(*id) {
                if *id < other && sub.contains(other) {
                    if let Some(weight) = self.edge_weight(*id, other) {
                        sub.add_edge(*id, other, weight)?;
                    }
                }
            }
        }
        Ok(sub)
    }
}

/// Graph equality is node-set and edge-set equality; container iteration
/// order and the duplicate-edge policy do not take part.
impl PartialEq for KnowledgeGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}

// ============================================================================
// Tests
// ============================================================================
