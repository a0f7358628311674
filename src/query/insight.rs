//! Insight path discovery.
//!
//! Seeds are the best similarity hits for the query that clear the
//! configured floor. From each seed a breadth-first walk of at most
//! `max_depth` hops collects connected ideas, strongest links first; the
//! seed plus the first discoveries form the path, which is summarized into
//! a one-line insight.

use std::collections::VecDeque;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::model::NodeId;
use crate::Result;
use super::QueryEngine;

/// One discovered path and its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightPath {
    pub query: String,
    /// Similarity of the seed (first path node) to the query.
    pub similarity: f32,
    pub path: Vec<NodeId>,
    pub path_contents: Vec<String>,
    pub insight: String,
}

impl QueryEngine<'_> {
    /// Insight paths for `query`, whose embedding the caller supplies.
    ///
    /// Empty when the graph is empty, when no node reaches
    /// `insight_min_similarity`, or when no seed has a reachable neighbour
    /// within `max_depth` hops.
    pub fn insight_paths(
        &self,
        query: &str,
        query_embedding: &[f32],
        max_depth: usize,
    ) -> Result<Vec<InsightPath>> {
        let seeds = self.find_similar(query_embedding, self.config.insight_seeds)?;
        let mut insights = Vec::new();

        for seed in seeds {
            if seed.similarity < self.config.insight_min_similarity {
                continue;
            }

            let discovered = self.strongest_first_walk(
                seed.id,
                max_depth,
                self.config.max_path_nodes.saturating_sub(1),
            );
            if discovered.is_empty() {
                continue;
            }

            let path: Vec<NodeId> = std::iter::once(seed.id).chain(discovered).collect();
            let path_contents: Vec<String> = path
                .iter()
                .filter_map(|id| self.graph.node(*id))
                .map(|node| node.content.clone())
                .collect();
            let insight = self.summarize(&path_contents);

            insights.push(InsightPath {
                query: query.to_string(),
                similarity: seed.similarity,
                path,
                path_contents,
                insight,
            });
        }

        Ok(insights)
    }

    /// BFS from `start`, at most `max_depth` hops, expanding neighbours by
    /// descending edge weight then ascending id. Returns up to `limit` nodes
    /// in discovery order, `start` excluded.
    fn strongest_first_walk(&self, start: NodeId, max_depth: usize, limit: usize) -> Vec<NodeId> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(start);
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut discovered = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            let mut next: Vec<(NodeId, f32)> = self.graph
                .adjacent(current)
                .iter()
                .filter(|id| !visited.contains(*id))
                .map(|id| (*id, self.graph.edge_weight(current, *id).unwrap_or(0.0)))
                .collect();
            next.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

            for (id, _) in next {
                if discovered.len() >= limit {
                    return discovered;
                }
                visited.insert(id);
                discovered.push(id);
                queue.push_back((id, depth + 1));
            }
        }

        discovered
    }

    fn summarize(&self, contents: &[String]) -> String {
        let excerpts: Vec<String> = contents
            .iter()
            .take(self.config.insight_excerpt_count)
            .map(|c| excerpt(c, self.config.insight_excerpt_chars))
            .collect();
        format!("Connection: {}", excerpts.join(" → "))
    }
}

fn excerpt(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
