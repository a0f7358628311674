//! JSON persistence — serialize a knowledge graph and load it back.
//!
//! ```text
//! KnowledgeGraph → export_graph() → GraphDocument → serde_json → file
//! file → serde_json → GraphDocument → import_graph() → KnowledgeGraph
//! ```
//!
//! Document shape:
//!
//! ```text
//! { "nodes": [ {id, content, embedding, resonance, emotion, timestamp} ],
//!   "edges": [ {source, target, weight} ] }
//! ```
//!
//! Nodes are written by ascending id and edges by ascending pair, so two
//! equal graphs always serialize to the same bytes. Embeddings and weights
//! are `f32`; serde_json prints the shortest decimal that parses back to the
//! same bits, so the round trip is exact.
//!
//! Import never returns a partial graph: any structural problem in the
//! document is reported as `Error::CorruptGraph`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::index::KnowledgeGraph;
use crate::model::*;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeRecord {
    pub id: NodeId,
    pub content: String,
    pub embedding: Vec<f32>,
    pub resonance: f32,
    pub emotion: String,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            content: node.content.clone(),
            embedding: node.embedding.clone(),
            resonance: node.resonance,
            emotion: node.emotion.clone(),
            timestamp: node.timestamp,
        }
    }
}

impl From<NodeRecord> for Node {
    fn from(rec: NodeRecord) -> Self {
        Node::new(rec.id, rec.content, rec.embedding)
            .with_resonance(rec.resonance)
            .with_emotion(rec.emotion)
            .with_timestamp(rec.timestamp)
    }
}

// ============================================================================
// Export
// ============================================================================

pub fn export_graph(graph: &KnowledgeGraph) -> GraphDocument {
    GraphDocument {
        nodes: graph.nodes().into_iter().map(NodeRecord::from).collect(),
        edges: graph
            .edges()
            .into_iter()
            .map(|e| EdgeRecord { source: e.source, target: e.target, weight: e.weight })
            .collect(),
    }
}

/// Pretty-printed JSON; non-ASCII text is written as-is.
pub fn to_json_string(graph: &KnowledgeGraph) -> Result<String> {
    serde_json::to_string_pretty(&export_graph(graph))
        .map_err(|e| Error::CorruptGraph(format!("cannot serialize graph: {e}")))
}

pub fn save_to_path(graph: &KnowledgeGraph, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = to_json_string(graph)?;
    std::fs::write(path, json)?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "knowledge graph saved"
    );
    Ok(())
}

// ============================================================================
// Import
// ============================================================================

pub fn import_graph(doc: GraphDocument) -> Result<KnowledgeGraph> {
    let mut graph = KnowledgeGraph::new();

    for rec in doc.nodes {
        let id = rec.id;
        graph.add_node(rec.into()).map_err(|e| corrupt("node", id, e))?;
    }

    for rec in doc.edges {
        if graph.edge_weight(rec.source, rec.target).is_some() {
            return Err(Error::CorruptGraph(format!(
                "edge {} -- {} listed twice",
                rec.source, rec.target
            )));
        }
        graph
            .add_edge(rec.source, rec.target, rec.weight)
            .map_err(|e| corrupt("edge from", rec.source, e))?;
    }

    Ok(graph)
}

pub fn from_json_str(json: &str) -> Result<KnowledgeGraph> {
    let doc: GraphDocument = serde_json::from_str(json)
        .map_err(|e| Error::CorruptGraph(e.to_string()))?;
    import_graph(doc)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<KnowledgeGraph> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let graph = from_json_str(&json)?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "knowledge graph loaded"
    );
    Ok(graph)
}

fn corrupt(what: &str, id: NodeId, err: Error) -> Error {
    Error::CorruptGraph(format!("{what} {id}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        g.add_node(
            Node::new(NodeId(0), "ИИ должен быть осознанным", vec![0.1, 0.2, 0.3])
                .with_resonance(0.9)
                .with_emotion("clarity")
                .with_timestamp(1_700_000_000.25),
        )
        .unwrap();
        g.add_node(Node::new(NodeId(3), "b", vec![0.3, 0.2, 0.1])).unwrap();
        g.add_edge(NodeId(3), NodeId(0), 0.7).unwrap();
        g
    }

    #[test]
    fn test_document_shape() {
        let json: serde_json::Value = serde_json::from_str(&to_json_string(&sample()).unwrap()).unwrap();
        assert_eq!(json["nodes"][0]["id"], 0);
        assert_eq!(json["nodes"][0]["emotion"], "clarity");
        assert_eq!(json["edges"][0]["source"], 0);
        assert_eq!(json["edges"][0]["target"], 3);
    }

    #[test]
    fn test_round_trip_string() {
        let g = sample();
        let back = from_json_str(&to_json_string(&g).unwrap()).unwrap();
        assert_eq!(back, g);
        assert_eq!(back.node(NodeId(0)).unwrap().embedding, vec![0.1f32, 0.2, 0.3]);
    }

    #[test]
    fn test_missing_field_is_corrupt() {
        let json = r#"{"nodes": [{"id": 0, "content": "x", "resonance": 0.5,
                       "emotion": "joy", "timestamp": 1.0}], "edges": []}"#;
        assert!(matches!(from_json_str(json), Err(Error::CorruptGraph(_))));
    }

    #[test]
    fn test_dangling_edge_is_corrupt() {
        let mut doc = export_graph(&sample());
        doc.edges.push(EdgeRecord { source: NodeId(0), target: NodeId(42), weight: 0.5 });
        assert!(matches!(import_graph(doc), Err(Error::CorruptGraph(_))));
    }

    #[test]
    fn test_duplicate_node_and_edge_are_corrupt() {
        let mut doc = export_graph(&sample());
        doc.nodes.push(doc.nodes[0].clone());
        assert!(matches!(import_graph(doc), Err(Error::CorruptGraph(_))));

        let mut doc = export_graph(&sample());
        doc.edges.push(EdgeRecord { source: NodeId(3), target: NodeId(0), weight: 0.2 });
        assert!(matches!(import_graph(doc), Err(Error::CorruptGraph(_))));
    }

    #[test]
    fn test_mixed_dimensions_are_corrupt() {
        let mut doc = export_graph(&sample());
        doc.nodes[1].embedding.push(1.0);
        assert!(matches!(import_graph(doc), Err(Error::CorruptGraph(_))));
    }

    #[test]
    fn test_not_json_is_corrupt() {
        assert!(matches!(from_json_str("{nodes"), Err(Error::CorruptGraph(_))));
    }
}
