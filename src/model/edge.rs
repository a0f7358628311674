//! Undirected, similarity-weighted edge.

use serde::{Deserialize, Serialize};
use super::NodeId;

/// Normalized key for an unordered node pair: `lo <= hi` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    lo: NodeId,
    hi: NodeId,
}

impl EdgeKey {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b { Self { lo: a, hi: b } } else { Self { lo: b, hi: a } }
    }

    pub fn lo(&self) -> NodeId {
        self.lo
    }

    pub fn hi(&self) -> NodeId {
        self.hi
    }

    /// The "other" end of the edge from the given node.
    pub fn other(&self, from: NodeId) -> Option<NodeId> {
        if from == self.lo { Some(self.hi) }
        else if from == self.hi { Some(self.lo) }
        else { None }
    }
}

/// An edge in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f32,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, weight: f32) -> Self {
        Self { source, target, weight }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source, self.target)
    }
}

/// What `add_edge` did with a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeInsert {
    Created,
    /// The pair already had an edge; its weight was replaced.
    Updated { previous: f32 },
}
