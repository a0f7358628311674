//! Structural importance ranking.
//!
//! Degree centrality is `degree / (n - 1)`; a lone node scores 1.0.
//! Betweenness is Brandes' algorithm over unweighted shortest paths,
//! normalized by the number of node pairs excluding the node itself,
//! `(n - 1)(n - 2) / 2`.

use std::collections::VecDeque;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::CentralityMeasure;
use crate::model::NodeId;
use super::{rank_desc, QueryEngine};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentralNode {
    pub id: NodeId,
    pub score: f64,
}

impl QueryEngine<'_> {
    /// The `top_k` most central nodes under the configured measure.
    pub fn central_nodes(&self, top_k: usize) -> Vec<CentralNode> {
        self.central_nodes_by(self.config.centrality, top_k)
    }

    pub fn central_nodes_by(&self, measure: CentralityMeasure, top_k: usize) -> Vec<CentralNode> {
        let scores = match measure {
            CentralityMeasure::Degree => self.degree_centrality(),
            CentralityMeasure::Betweenness => self.betweenness_centrality(),
        };

        let mut ranked: Vec<CentralNode> = scores
            .into_iter()
            .map(|(id, score)| CentralNode { id, score })
            .collect();
        ranked.sort_by(|a, b| rank_desc((a.score, a.id), (b.score, b.id)));
        ranked.truncate(top_k);
        ranked
    }

    pub fn degree_centrality(&self) -> Vec<(NodeId, f64)> {
        let ids = self.graph.node_ids();
        let n = ids.len();
        ids.into_iter()
            .map(|id| {
                let score = if n <= 1 {
                    1.0
                } else {
                    self.graph.adjacent(id).len() as f64 / (n - 1) as f64
                };
                (id, score)
            })
            .collect()
    }

    pub fn betweenness_centrality(&self) -> Vec<(NodeId, f64)> {
        let ids = self.graph.node_ids();
        let n = ids.len();
        let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let adjacency: Vec<Vec<usize>> = ids
            .iter()
            .map(|id| self.graph.adjacent(*id).iter().map(|nb| index[nb]).collect())
            .collect();

        let mut betweenness = vec![0.0f64; n];

        for s in 0..n {
            let mut stack = Vec::with_capacity(n);
            let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
            let mut sigma = vec![0.0f64; n];
            let mut distance = vec![-1i64; n];
            sigma[s] = 1.0;
            distance[s] = 0;

            let mut queue = VecDeque::from([s]);
            while let Some(v) = queue.pop_front() {
                stack.push(v);
                for &w in &adjacency[v] {
                    if distance[w] < 0 {
                        distance[w] = distance[v] + 1;
                        queue.push_back(w);
                    }
                    if distance[w] == distance[v] + 1 {
                        sigma[w] += sigma[v];
                        predecessors[w].push(v);
                    }
                }
            }

            let mut delta = vec![0.0f64; n];
            while let Some(w) = stack.pop() {
                for &v in &predecessors[w] {
                    delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
                }
                if w != s {
                    betweenness[w] += delta[w];
                }
            }
        }

        // Each unordered pair was counted from both ends.
        let scale = if n > 2 { 1.0 / ((n - 1) * (n - 2)) as f64 } else { 0.0 };
        ids.into_iter()
            .zip(betweenness)
            .map(|(id, b)| (id, b * scale))
            .collect()
    }
}
