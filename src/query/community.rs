//! # Community Detection
//!
//! Greedy modularity agglomeration (Clauset, Newman & Moore 2004).
//!
//! Every node starts in its own community. At each step the pair of
//! adjacent communities whose merge increases modularity the most is
//! merged; ties go to the lowest pair of community indices, which makes
//! the result a pure function of the graph. The loop stops when no merge
//! has a positive gain.
//!
//! For communities `i`, `j` with internal-link weight `w_ij`, degree sums
//! `d_i`, `d_j` and total edge weight `m`, the gain is
//!
//! ```text
//! ΔQ = w_ij / m − d_i · d_j / (2 m²)
//! ```
//!
//! Community `i` always keeps the lower index, so it always contains the
//! node with sorted position `i` as its smallest member.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::index::KnowledgeGraph;
use crate::model::NodeId;
use super::QueryEngine;

const GAIN_EPSILON: f64 = 1e-12;

/// A partition of the graph's nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communities {
    /// Members ascending; groups by descending size, then smallest member.
    pub groups: Vec<Vec<NodeId>>,
    /// Modularity of this partition.
    pub modularity: f64,
}

impl Communities {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Node → index into `groups`.
    pub fn assignment(&self) -> HashMap<NodeId, usize> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(label, members)| members.iter().map(move |id| (*id, label)))
            .collect()
    }

    pub fn community_of(&self, id: NodeId) -> Option<usize> {
        self.groups.iter().position(|members| members.binary_search(&id).is_ok())
    }
}

impl QueryEngine<'_> {
    pub fn communities(&self) -> Communities {
        detect_communities(self.graph, self.config.weighted_communities)
    }
}

/// Run greedy modularity over the whole graph.
pub fn detect_communities(graph: &KnowledgeGraph, weighted: bool) -> Communities {
    let ids = graph.node_ids();
    let n = ids.len();
    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let weight_of = |w: f32| if weighted { f64::from(w) } else { 1.0 };

    let mut members: Vec<Vec<NodeId>> = ids.iter().map(|id| vec![*id]).collect();
    let mut degree = vec![0.0f64; n];
    // (lower index, higher index) → total weight between the two communities.
    // The merge scan and the weight sums visit pairs by ascending key.
    let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    let mut total = 0.0f64;

    for edge in graph.edges() {
        let (a, b) = (index[&edge.source], index[&edge.target]);
        let w = weight_of(edge.weight);
        degree[a] += w;
        degree[b] += w;
        total += w;
        *between.entry((a.min(b), a.max(b))).or_insert(0.0) += w;
    }

    let mut merges = 0usize;
    if total > 0.0 {
        let m = total;
        loop {
            let mut best: Option<((usize, usize), f64)> = None;
            for (&pair, &w) in &between {
                let gain = w / m - degree[pair.0] * degree[pair.1] / (2.0 * m * m);
                let better = match best {
                    None => true,
                    Some((best_pair, best_gain)) => {
                        gain > best_gain + GAIN_EPSILON
                            || ((gain - best_gain).abs() <= GAIN_EPSILON && pair < best_pair)
                    }
                };
                if better {
                    best = Some((pair, gain));
                }
            }

            let Some(((keep, absorb), gain)) = best else { break };
            if gain <= GAIN_EPSILON {
                break;
            }

            let moved = std::mem::take(&mut members[absorb]);
            members[keep].extend(moved);
            degree[keep] += degree[absorb];
            degree[absorb] = 0.0;
            between.remove(&(keep, absorb));

            let touching: Vec<((usize, usize), f64)> = between
                .iter()
                .filter(|(pair, _)| pair.0 == absorb || pair.1 == absorb)
                .map(|(pair, w)| (*pair, *w))
                .collect();
            for (pair, w) in touching {
                between.remove(&pair);
                let other = if pair.0 == absorb { pair.1 } else { pair.0 };
                *between.entry((keep.min(other), keep.max(other))).or_insert(0.0) += w;
            }
            merges += 1;
        }
    }

    let mut groups: Vec<Vec<NodeId>> = members.into_iter().filter(|g| !g.is_empty()).collect();
    for group in &mut groups {
        group.sort_unstable();
    }
    groups.sort_by(|a, b| b.len().cmp(&a.len()).then(a[0].cmp(&b[0])));

    let modularity = modularity(graph, &groups, weighted);
    tracing::debug!(nodes = n, merges, communities = groups.len(), modularity, "communities detected");

    Communities { groups, modularity }
}

/// Newman modularity of a partition: `Σ_c [ L_c / m − (d_c / 2m)² ]`.
/// Zero for a graph without edges.
pub fn modularity(graph: &KnowledgeGraph, groups: &[Vec<NodeId>], weighted: bool) -> f64 {
    let label: HashMap<NodeId, usize> = groups
        .iter()
        .enumerate()
        .flat_map(|(c, members)| members.iter().map(move |id| (*id, c)))
        .collect();

    let mut internal = vec![0.0f64; groups.len()];
    let mut degree = vec![0.0f64; groups.len()];
    let mut m = 0.0f64;

    for edge in graph.edges() {
        let w = if weighted { f64::from(edge.weight) } else { 1.0 };
        m += w;
        let (Some(&ca), Some(&cb)) = (label.get(&edge.source), label.get(&edge.target)) else {
            continue;
        };
        degree[ca] += w;
        degree[cb] += w;
        if ca == cb {
            internal[ca] += w;
        }
    }

    if m == 0.0 {
        return 0.0;
    }
    internal
        .iter()
        .zip(&degree)
        .map(|(l, d)| l / m - (d / (2.0 * m)).powi(2))
        .sum()
}
