//! Whole-graph statistics.

use std::collections::VecDeque;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::model::NodeId;
use super::KnowledgeGraph;

/// Summary numbers for a graph.
///
/// Conventions for degenerate graphs: an empty graph has density 0,
/// clustering 0, zero components and counts as connected (vacuously).
/// A single isolated node has density 0 and one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// `edges / (n * (n - 1) / 2)`
    pub density: f64,
    /// Mean local clustering coefficient; nodes with degree < 2 count as 0.
    pub avg_clustering: f64,
    pub is_connected: bool,
    pub num_components: usize,
}

impl KnowledgeGraph {
    pub fn stats(&self) -> GraphStats {
        let n = self.node_count();
        let e = self.edge_count();

        let density = if n < 2 {
            0.0
        } else {
            (2 * e) as f64 / (n * (n - 1)) as f64
        };

        let avg_clustering = if n == 0 {
            0.0
        } else {
            let ids = self.node_ids();
            ids.iter().map(|id| self.local_clustering(*id)).sum::<f64>() / n as f64
        };

        let num_components = self.connected_components().len();

        GraphStats {
            total_nodes: n,
            total_edges: e,
            density,
            avg_clustering,
            is_connected: num_components <= 1,
            num_components,
        }
    }

    /// Fraction of neighbour pairs that are themselves connected.
    pub fn local_clustering(&self, id: NodeId) -> f64 {
        let neighbours = self.adjacent(id);
        let k = neighbours.len();
        if k < 2 {
            return 0.0;
        }

        let mut links = 0usize;
        for (i, a) in neighbours.iter().enumerate() {
            for b in &neighbours[i + 1..] {
                if self.edge_weight(*a, *b).is_some() {
                    links += 1;
                }
            }
        }
        (2 * links) as f64 / (k * (k - 1)) as f64
    }

    /// Connected components, each sorted ascending, ordered by smallest id.
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut components = Vec::new();

        for start in self.node_ids() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for &next in self.adjacent(current) {
                    if seen.insert(next) {
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        components
    }
}
