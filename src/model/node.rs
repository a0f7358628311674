//! Node in the knowledge graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque node identifier.
///
/// Ids are derived from the position of the source trace in the ingested
/// sequence, so two builds over the same input produce the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// A reasoning trace materialized as a graph node.
///
/// Every field is fixed at creation. Degree is not stored here; ask the
/// graph via [`KnowledgeGraph::degree`](crate::index::KnowledgeGraph::degree).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub content: String,
    pub embedding: Vec<f32>,
    pub resonance: f32,
    pub emotion: String,
    /// Unix seconds as supplied by the trace store.
    pub timestamp: f64,
}

impl Node {
    pub fn new(id: NodeId, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id,
            content: content.into(),
            embedding,
            resonance: 0.5,
            emotion: "neutral".to_string(),
            timestamp: 0.0,
        }
    }

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.resonance = resonance;
        self
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = emotion.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The trace timestamp as a UTC datetime, if it is representable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if !self.timestamp.is_finite() {
            return None;
        }
        let secs = self.timestamp.floor();
        let nanos = ((self.timestamp - secs) * 1e9).round() as u32;
        DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
    }

    /// Dimensionality of the stored embedding.
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}
