//! # Graph Builder
//!
//! Turns trace records into nodes and similarity-weighted edges.
//!
//! Building runs in two phases:
//!
//! ```text
//! prepare()  async  filter by resonance, validate, embed   (no graph access)
//! commit()   sync   assign ids, insert nodes, pairwise cosine → edges
//! ```
//!
//! The split lets a caller holding the graph behind a lock embed first
//! and take the write guard only for the CPU-bound commit.
//!
//! Node ids are `next_id + position in the input slice`, so the same input
//! always yields the same ids. A trace that cannot be embedded or fails
//! validation is skipped with a warning and listed in the [`BuildReport`];
//! one bad trace never aborts the build.

use serde::Serialize;

use crate::config::{DuplicateEdgePolicy, GraphConfig};
use crate::embed::{cosine_similarity, Embedder, EmbeddingFailure};
use crate::index::KnowledgeGraph;
use crate::model::*;
use crate::{Error, Result};

// ============================================================================
// Report types
// ============================================================================

/// Why a trace did not become a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    Invalid(String),
    Embedding(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Invalid(msg) => write!(f, "invalid trace: {msg}"),
            SkipReason::Embedding(msg) => write!(f, "embedding failed: {msg}"),
        }
    }
}

impl From<EmbeddingFailure> for SkipReason {
    fn from(failure: EmbeddingFailure) -> Self {
        SkipReason::Embedding(failure.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTrace {
    /// Position in the input slice.
    pub index: usize,
    pub reason: SkipReason,
}

/// What a build or extend did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub total: usize,
    pub admitted: usize,
    /// Below the resonance threshold. Not an error.
    pub filtered: usize,
    pub skipped: Vec<SkippedTrace>,
    pub edges_created: usize,
}

/// A freshly built graph together with its report.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: KnowledgeGraph,
    pub report: BuildReport,
}

/// Embedded traces waiting for ids.
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    /// (input position, node with placeholder id)
    pending: Vec<(usize, Node)>,
    report: BuildReport,
}

impl PreparedBatch {
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ============================================================================
// GraphBuilder
// ============================================================================

pub struct GraphBuilder<'e, E: Embedder + ?Sized> {
    embedder: &'e E,
    similarity_threshold: f32,
    policy: DuplicateEdgePolicy,
}

impl<'e, E: Embedder + ?Sized> GraphBuilder<'e, E> {
    pub fn new(embedder: &'e E) -> Self {
        Self::from_config(embedder, &GraphConfig::default())
    }

    pub fn from_config(embedder: &'e E, config: &GraphConfig) -> Self {
        Self {
            embedder,
            similarity_threshold: config.similarity_threshold,
            policy: config.duplicate_edge_policy,
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Build a new graph from `traces`.
    pub async fn build(&self, traces: &[TraceRecord], min_resonance: f32) -> Result<BuildOutcome> {
        check_min_resonance(min_resonance)?;
        let batch = self.prepare(traces, min_resonance, None).await;
        let mut graph = KnowledgeGraph::with_policy(self.policy);
        let report = self.commit(&mut graph, batch)?;
        Ok(BuildOutcome { graph, report })
    }

    /// Grow an existing graph with more traces.
    pub async fn extend(
        &self,
        graph: &mut KnowledgeGraph,
        traces: &[TraceRecord],
        min_resonance: f32,
    ) -> Result<BuildReport> {
        check_min_resonance(min_resonance)?;
        let batch = self.prepare(traces, min_resonance, graph.dimension()).await;
        self.commit(graph, batch)
    }

    /// Filter, validate and embed. `dimension` is the graph's locked
    /// dimension, if any; otherwise the embedder's is used.
    pub async fn prepare(
        &self,
        traces: &[TraceRecord],
        min_resonance: f32,
        dimension: Option<usize>,
    ) -> PreparedBatch {
        let expected = dimension.unwrap_or_else(|| self.embedder.dimension());
        let mut batch = PreparedBatch {
            report: BuildReport { total: traces.len(), ..BuildReport::default() },
            ..PreparedBatch::default()
        };

        for (index, trace) in traces.iter().enumerate() {
            if let Err(e) = trace.validate() {
                let reason = match e {
                    Error::InvalidTrace(msg) => SkipReason::Invalid(msg),
                    other => SkipReason::Invalid(other.to_string()),
                };
                skip(&mut batch.report, index, reason);
                continue;
            }
            if trace.resonance < min_resonance {
                batch.report.filtered += 1;
                continue;
            }

            let embedding = match &trace.embedding {
                Some(attached) if attached.len() == expected => attached.clone(),
                Some(attached) => {
                    let failure = EmbeddingFailure::Dimension { expected, got: attached.len() };
                    skip(&mut batch.report, index, failure.into());
                    continue;
                }
                None => match self.embedder.embed_checked(&trace.content).await {
                    Ok(v) if v.len() == expected => v,
                    Ok(v) => {
                        let failure = EmbeddingFailure::Dimension { expected, got: v.len() };
                        skip(&mut batch.report, index, failure.into());
                        continue;
                    }
                    Err(failure) => {
                        skip(&mut batch.report, index, failure.into());
                        continue;
                    }
                },
            };

            let node = Node::new(NodeId(0), trace.content.clone(), embedding)
                .with_resonance(trace.resonance)
                .with_emotion(trace.emotion.clone())
                .with_timestamp(trace.timestamp);
            batch.pending.push((index, node));
        }

        batch
    }

    /// Insert prepared nodes and connect every pair above the threshold.
    pub fn commit(&self, graph: &mut KnowledgeGraph, batch: PreparedBatch) -> Result<BuildReport> {
        let PreparedBatch { pending, mut report } = batch;
        let offset = graph.next_id().0;
        let existing = graph.node_ids();
        let mut added: Vec<NodeId> = Vec::with_capacity(pending.len());

        for (index, mut node) in pending {
            node.id = NodeId(offset + index as u64);
            match graph.add_node(node) {
                Ok(()) => {
                    report.admitted += 1;
                    added.push(NodeId(offset + index as u64));
                }
                Err(Error::DimensionMismatch { expected, got }) => {
                    let failure = EmbeddingFailure::Dimension { expected, got };
                    skip(&mut report, index, failure.into());
                }
                Err(e @ Error::NonFiniteNode(_)) => {
                    skip(&mut report, index, SkipReason::Invalid(e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        for (i, &new_id) in added.iter().enumerate() {
            let candidates = existing.iter().chain(&added[..i]);
            for &other in candidates {
                if let Some(weight) = self.similarity(graph, new_id, other) {
                    graph.add_edge(other, new_id, weight)?;
                    report.edges_created += 1;
                }
            }
        }

        tracing::debug!(
            total = report.total,
            admitted = report.admitted,
            filtered = report.filtered,
            skipped = report.skipped.len(),
            edges = report.edges_created,
            "knowledge graph batch committed"
        );
        Ok(report)
    }

    /// Edge weight for a pair, or `None` when not above the threshold.
    fn similarity(&self, graph: &KnowledgeGraph, a: NodeId, b: NodeId) -> Option<f32> {
        let (na, nb) = (graph.node(a)?, graph.node(b)?);
        let sim = cosine_similarity(&na.embedding, &nb.embedding);
        (sim > self.similarity_threshold).then(|| sim.clamp(0.0, 1.0))
    }
}

fn check_min_resonance(min_resonance: f32) -> Result<()> {
    if !min_resonance.is_finite() || !(0.0..=1.0).contains(&min_resonance) {
        return Err(Error::Config(format!("min_resonance {min_resonance} outside [0, 1]")));
    }
    Ok(())
}

fn skip(report: &mut BuildReport, index: usize, reason: SkipReason) {
    tracing::warn!(index, %reason, "skipping trace");
    report.skipped.push(SkippedTrace { index, reason });
}

// ============================================================================
// Tests
// ============================================================================
