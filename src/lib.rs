//! # resonance-graph — Knowledge Graph over Reasoning Traces
//!
//! Records an agent's reasoning traces (text + resonance score + emotion)
//! as a similarity graph and answers analytic queries over it.
//!
//! ## Design Principles
//!
//! 1. **Owned state**: `KnowledgeGraph` is a plain value; no global graph
//! 2. **Trait-first embedding**: `Embedder` is the only seam to the outside
//!    world, and the only call that may be slow
//! 3. **Reads are pure**: `QueryEngine` borrows the graph immutably
//! 4. **Deterministic**: ids come from input position, ties break by id
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resonance_graph::{Engine, GraphConfig, HashingEmbedder, TraceRecord};
//!
//! # async fn example() -> resonance_graph::Result<()> {
//! let engine = Engine::new(HashingEmbedder::default(), GraphConfig::default())?;
//!
//! let traces = vec![
//!     TraceRecord::new("awareness includes self reflection", 0.9).with_emotion("clarity"),
//!     TraceRecord::new("self reflection requires metacognition", 0.8),
//! ];
//! let report = engine.build(&traces, 0.5).await?;
//! assert!(report.skipped.is_empty());
//!
//! for hit in engine.find_similar("what is reflection?", 3).await? {
//!     println!("{} {:.2}", hit.id, hit.similarity);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | `builder` | traces → nodes + similarity edges |
//! | `index` | `KnowledgeGraph` store, traversal, stats |
//! | `query` | similarity, centrality, communities, insight paths |
//! | `export` | JSON export/import, save/load |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod config;
pub mod embed;
pub mod index;
pub mod builder;
pub mod query;
pub mod export;

use std::path::Path;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{Node, NodeId, Edge, EdgeKey, EdgeInsert, TraceRecord, parse_trace_log};
pub use config::{GraphConfig, DuplicateEdgePolicy, CentralityMeasure};
pub use embed::{Embedder, EmbeddingFailure, HashingEmbedder, cosine_similarity};
pub use index::{KnowledgeGraph, GraphStats};
pub use builder::{GraphBuilder, BuildOutcome, BuildReport, SkippedTrace, SkipReason};
pub use query::{QueryEngine, SimilarNode, CentralNode, Communities, InsightPath};
pub use export::GraphDocument;

// ============================================================================
// Top-level Engine handle
// ============================================================================

/// The primary entry point. An `Engine` owns one knowledge graph behind a
/// readers-writer lock, plus the embedder used both to build and to query.
///
/// Cloning is cheap and shares the same graph. Locks are never held across
/// an embedding call: text is embedded first, then the guard is taken.
pub struct Engine<E: Embedder> {
    graph: Arc<RwLock<KnowledgeGraph>>,
    embedder: Arc<E>,
    config: GraphConfig,
}

impl<E: Embedder> Clone for Engine<E> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            embedder: Arc::clone(&self.embedder),
            config: self.config.clone(),
        }
    }
}

impl<E: Embedder> Engine<E> {
    /// An engine over an empty graph.
    pub fn new(embedder: E, config: GraphConfig) -> Result<Self> {
        Self::with_graph(embedder, config, KnowledgeGraph::new())
    }

    /// An engine over an existing graph, e.g. one restored from disk.
    pub fn with_graph(embedder: E, config: GraphConfig, mut graph: KnowledgeGraph) -> Result<Self> {
        config.validate()?;
        graph.set_policy(config.duplicate_edge_policy);
        Ok(Self {
            graph: Arc::new(RwLock::new(graph)),
            embedder: Arc::new(embedder),
            config,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Shared read access to the graph. Hold it briefly: writers wait.
    pub fn graph(&self) -> RwLockReadGuard<'_, KnowledgeGraph> {
        self.graph.read()
    }

    /// A detached copy of the current graph.
    pub fn snapshot(&self) -> KnowledgeGraph {
        self.graph.read().clone()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Replace the graph with one built from `traces`.
    pub async fn build(&self, traces: &[TraceRecord], min_resonance: f32) -> Result<BuildReport> {
        let outcome = self.builder().build(traces, min_resonance).await?;
        let mut fresh = outcome.graph;
        fresh.set_policy(self.config.duplicate_edge_policy);
        *self.graph.write() = fresh;
        Ok(outcome.report)
    }

    /// Add `traces` to the current graph using the configured
    /// `min_resonance`.
    pub async fn ingest(&self, traces: &[TraceRecord]) -> Result<BuildReport> {
        let builder = self.builder();
        let dimension = self.graph.read().dimension();
        let batch = builder.prepare(traces, self.config.min_resonance, dimension).await;
        let mut graph = self.graph.write();
        builder.commit(&mut graph, batch)
    }

    pub fn clear(&self) {
        self.graph.write().clear();
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The `top_k` nodes most similar to `query`. A query with no
    /// embeddable tokens matches nothing.
    pub async fn find_similar(&self, query: &str, top_k: usize) -> Result<Vec<SimilarNode>> {
        if top_k == 0 || self.graph.read().is_empty() {
            return Ok(Vec::new());
        }
        let Some(embedding) = self.embed_query(query).await? else {
            return Ok(Vec::new());
        };
        let graph = self.graph.read();
        QueryEngine::with_config(&graph, &self.config).find_similar(&embedding, top_k)
    }

    pub async fn insight_paths(&self, query: &str, max_depth: usize) -> Result<Vec<InsightPath>> {
        if self.graph.read().is_empty() {
            return Ok(Vec::new());
        }
        let Some(embedding) = self.embed_query(query).await? else {
            return Ok(Vec::new());
        };
        let graph = self.graph.read();
        QueryEngine::with_config(&graph, &self.config).insight_paths(query, &embedding, max_depth)
    }

    pub fn central_nodes(&self, top_k: usize) -> Vec<CentralNode> {
        let graph = self.graph.read();
        QueryEngine::with_config(&graph, &self.config).central_nodes(top_k)
    }

    pub fn communities(&self) -> Communities {
        let graph = self.graph.read();
        QueryEngine::with_config(&graph, &self.config).communities()
    }

    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Option<Vec<NodeId>>> {
        let graph = self.graph.read();
        QueryEngine::with_config(&graph, &self.config).shortest_path(from, to)
    }

    pub fn neighbors(&self, id: NodeId, max_depth: usize) -> Result<Vec<NodeId>> {
        self.graph.read().neighbors(id, max_depth)
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.read().stats()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn export(&self) -> GraphDocument {
        export::export_graph(&self.graph.read())
    }

    /// Replace the graph with the imported document. On error the current
    /// graph is left untouched.
    pub fn import(&self, doc: GraphDocument) -> Result<()> {
        let mut imported = export::import_graph(doc)?;
        imported.set_policy(self.config.duplicate_edge_policy);
        *self.graph.write() = imported;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        export::save_to_path(&self.graph.read(), path)
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut loaded = export::load_from_path(path)?;
        loaded.set_policy(self.config.duplicate_edge_policy);
        *self.graph.write() = loaded;
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn builder(&self) -> GraphBuilder<'_, E> {
        GraphBuilder::from_config(self.embedder.as_ref(), &self.config)
    }

    /// `None` when the query has nothing to embed.
    async fn embed_query(&self, query: &str) -> Result<Option<Vec<f32>>> {
        match self.embedder.embed_checked(query).await {
            Ok(embedding) => Ok(Some(embedding)),
            Err(EmbeddingFailure::EmptyInput) => Ok(None),
            Err(failure) => Err(failure.into()),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Duplicate edge: {0} -- {1}")]
    DuplicateEdge(NodeId, NodeId),

    #[error("Corrupt graph: {0}")]
    CorruptGraph(String),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingFailure),

    #[error("Invalid trace: {0}")]
    InvalidTrace(String),

    #[error("Node {0} has a non-finite embedding, resonance or timestamp")]
    NonFiniteNode(NodeId),

    #[error("Self-loop on node {0}")]
    SelfLoop(NodeId),

    #[error("Invalid edge weight {0}: must be finite and within [0, 1]")]
    InvalidWeight(f32),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
