//! Engine configuration.
//!
//! Every knob has a default that matches the behaviour callers have relied
//! on historically; a JSON document only needs the fields it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use crate::{Error, Result};

// ============================================================================
// Policies
// ============================================================================

/// What `add_edge` does when the pair already has an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateEdgePolicy {
    /// Replace the stored weight.
    #[default]
    Update,
    /// Fail with `Error::DuplicateEdge`.
    Reject,
}

/// Measure used by `central_nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentralityMeasure {
    /// `degree / (n - 1)`.
    #[default]
    Degree,
    /// Brandes betweenness over unweighted shortest paths.
    Betweenness,
}

// ============================================================================
// GraphConfig
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// Traces below this resonance are not ingested.
    pub min_resonance: f32,
    /// An edge is created when cosine similarity is strictly above this.
    pub similarity_threshold: f32,
    pub duplicate_edge_policy: DuplicateEdgePolicy,
    pub centrality: CentralityMeasure,
    /// Use edge weights in modularity; otherwise every edge counts as 1.
    pub weighted_communities: bool,
    /// How many similarity hits seed insight paths.
    pub insight_seeds: usize,
    /// Seeds must reach at least this similarity.
    pub insight_min_similarity: f32,
    /// Seed plus discovered nodes.
    pub max_path_nodes: usize,
    /// Characters kept from each node content in the insight text.
    pub insight_excerpt_chars: usize,
    /// Number of node contents quoted in the insight text.
    pub insight_excerpt_count: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_resonance: 0.3,
            similarity_threshold: 0.5,
            duplicate_edge_policy: DuplicateEdgePolicy::Update,
            centrality: CentralityMeasure::Degree,
            weighted_communities: false,
            insight_seeds: 3,
            insight_min_similarity: 0.1,
            max_path_nodes: 6,
            insight_excerpt_chars: 30,
            insight_excerpt_count: 3,
        }
    }
}

impl GraphConfig {
    pub fn with_min_resonance(mut self, value: f32) -> Self {
        self.min_resonance = value;
        self
    }

    pub fn with_similarity_threshold(mut self, value: f32) -> Self {
        self.similarity_threshold = value;
        self
    }

    pub fn with_duplicate_edge_policy(mut self, policy: DuplicateEdgePolicy) -> Self {
        self.duplicate_edge_policy = policy;
        self
    }

    pub fn with_centrality(mut self, measure: CentralityMeasure) -> Self {
        self.centrality = measure;
        self
    }

    pub fn with_weighted_communities(mut self, weighted: bool) -> Self {
        self.weighted_communities = weighted;
        self
    }

    pub fn with_insight_seeds(mut self, seeds: usize) -> Self {
        self.insight_seeds = seeds;
        self
    }

    pub fn with_insight_min_similarity(mut self, value: f32) -> Self {
        self.insight_min_similarity = value;
        self
    }

    pub fn with_max_path_nodes(mut self, nodes: usize) -> Self {
        self.max_path_nodes = nodes;
        self
    }

    pub fn with_insight_excerpt_chars(mut self, chars: usize) -> Self {
        self.insight_excerpt_chars = chars;
        self
    }

    pub fn with_insight_excerpt_count(mut self, count: usize) -> Self {
        self.insight_excerpt_count = count;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: GraphConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_resonance.is_finite() || !(0.0..=1.0).contains(&self.min_resonance) {
            return Err(Error::Config(format!(
                "min_resonance {} outside [0, 1]",
                self.min_resonance
            )));
        }
        if !self.similarity_threshold.is_finite() || !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(format!(
                "similarity_threshold {} outside [-1, 1]",
                self.similarity_threshold
            )));
        }
        if !self.insight_min_similarity.is_finite() {
            return Err(Error::Config("insight_min_similarity is not finite".into()));
        }
        if self.max_path_nodes < 2 {
            return Err(Error::Config("max_path_nodes must be at least 2".into()));
        }
        Ok(())
    }
}
