//! # Query Engine
//!
//! Read-only analytics over a [`KnowledgeGraph`]. A `QueryEngine` only holds
//! a shared borrow of the graph, so it cannot mutate it, and any number of
//! engines can run in parallel over the same snapshot.
//!
//! | Operation | Algorithm |
//! |-----------|-----------|
//! | [`QueryEngine::find_similar`] | cosine similarity, full scan |
//! | [`QueryEngine::central_nodes`] | degree or Brandes betweenness |
//! | [`QueryEngine::communities`] | greedy modularity (Clauset–Newman–Moore) |
//! | [`QueryEngine::insight_paths`] | similarity seeds + weight-ordered BFS |
//! | [`QueryEngine::shortest_path`] | unweighted BFS |
//!
//! Every ranking breaks ties by ascending node id.
//!
//! Operations that start from text take the query embedding precomputed;
//! [`Engine`](crate::Engine) wraps them with the embedding call.

pub mod centrality;
pub mod community;
pub mod insight;

use std::cmp::Ordering;
use std::collections::VecDeque;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::GraphConfig;
use crate::embed::cosine_similarity;
use crate::index::KnowledgeGraph;
use crate::model::NodeId;
use crate::{Error, Result};

pub use centrality::CentralNode;
pub use community::Communities;
pub use insight::InsightPath;

/// A similarity search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarNode {
    pub id: NodeId,
    pub similarity: f32,
}

/// Descending score, then ascending id.
pub(crate) fn rank_desc(a: (f64, NodeId), b: (f64, NodeId)) -> Ordering {
    b.0.total_cmp(&a.0).then(a.1.cmp(&b.1))
}

// ============================================================================
// QueryEngine
// ============================================================================

pub struct QueryEngine<'g> {
    graph: &'g KnowledgeGraph,
    config: GraphConfig,
}

impl<'g> QueryEngine<'g> {
    pub fn new(graph: &'g KnowledgeGraph) -> Self {
        Self::with_config(graph, &GraphConfig::default())
    }

    pub fn with_config(graph: &'g KnowledgeGraph, config: &GraphConfig) -> Self {
        Self { graph, config: config.clone() }
    }

    pub fn graph(&self) -> &'g KnowledgeGraph {
        self.graph
    }

    /// The `top_k` nodes most similar to `query_embedding`.
    ///
    /// An empty graph or `top_k == 0` gives an empty result. A query whose
    /// length differs from the graph's embedding dimension is an error.
    pub fn find_similar(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SimilarNode>> {
        if top_k == 0 || self.graph.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.graph.dimension() {
            if expected != query_embedding.len() {
                return Err(Error::DimensionMismatch { expected, got: query_embedding.len() });
            }
        }

        let mut hits: Vec<SimilarNode> = self.graph
            .nodes()
            .into_iter()
            .map(|node| SimilarNode {
                id: node.id,
                similarity: cosine_similarity(query_embedding, &node.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            rank_desc((f64::from(a.similarity), a.id), (f64::from(b.similarity), b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Fewest-hop path from `from` to `to`, inclusive.
    ///
    /// Neighbours are explored in ascending id order, so among equally short
    /// paths the lexicographically smallest one is returned.
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Option<Vec<NodeId>>> {
        if !self.graph.contains(from) {
            return Err(Error::UnknownNode(from));
        }
        if !self.graph.contains(to) {
            return Err(Error::UnknownNode(to));
        }
        if from == to {
            return Ok(Some(vec![from]));
        }

        let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            for &next in self.graph.adjacent(current) {
                if next == from || parent.contains_key(&next) {
                    continue;
                }
                parent.insert(next, current);
                if next == to {
                    let mut path = vec![to];
                    let mut cursor = to;
                    while let Some(&prev) = parent.get(&cursor) {
                        path.push(prev);
                        cursor = prev;
                    }
                    path.reverse();
                    return Ok(Some(path));
                }
                queue.push_back(next);
            }
        }

        Ok(None)
    }
}

// ============================================================================
// Tests
// ============================================================================
