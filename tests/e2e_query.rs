//! End-to-end tests for the query surface: similarity search, centrality,
//! communities, insight paths and concurrent readers.

use std::collections::HashMap;
use std::thread;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use resonance_graph::{
    CentralityMeasure, Embedder, EmbeddingFailure, Engine, Error, GraphConfig, HashingEmbedder,
    NodeId, TraceRecord,
};

// ============================================================================
// Helper: a lookup-table embedder with hand-picked vectors.
// ============================================================================

/// Maps known texts to fixed 4-d vectors; anything else is a provider error.
struct TableEmbedder {
    table: HashMap<&'static str, [f32; 4]>,
}

impl TableEmbedder {
    fn new() -> Self {
        let table = HashMap::from([
            // cluster A around axis 0
            ("a0", [1.0, 0.0, 0.0, 0.0]),
            ("a1", [0.95, 0.31, 0.0, 0.0]),
            ("a2", [0.9, 0.0, 0.43, 0.0]),
            // cluster B around axis 3
            ("b0", [0.0, 0.0, 0.0, 1.0]),
            ("b1", [0.0, 0.31, 0.0, 0.95]),
            ("b2", [0.0, 0.0, 0.43, 0.9]),
            // queries
            ("query-a", [1.0, 0.0, 0.0, 0.0]),
            ("query-b", [0.0, 0.0, 0.0, 1.0]),
            ("query-none", [0.0, -1.0, 0.0, 0.0]),
        ]);
        Self { table }
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingFailure> {
        self.table
            .get(text)
            .map(|v| v.to_vec())
            .ok_or_else(|| EmbeddingFailure::Provider(format!("no vector for {text:?}")))
    }

    fn dimension(&self) -> usize {
        4
    }
}

fn two_clusters() -> Vec<TraceRecord> {
    ["a0", "a1", "a2", "b0", "b1", "b2"]
        .into_iter()
        .map(|text| TraceRecord::new(text, 0.9).with_emotion("clarity"))
        .collect()
}

async fn clustered_engine(config: GraphConfig) -> Engine<TableEmbedder> {
    let engine = Engine::new(TableEmbedder::new(), config).unwrap();
    let report = engine.build(&two_clusters(), 0.5).await.unwrap();
    assert!(report.skipped.is_empty());
    engine
}

// ============================================================================
// 1. find_similar
// ============================================================================

#[tokio::test]
async fn test_find_similar_orders_by_similarity() {
    let engine = clustered_engine(GraphConfig::default()).await;

    let hits = engine.find_similar("query-a", 3).await.unwrap();
    let ids: Vec<NodeId> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![NodeId(0), NodeId(1), NodeId(2)]);
    assert!((hits[0].similarity - 1.0).abs() < 1e-6);
    assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[tokio::test]
async fn test_find_similar_bounds() {
    let engine = clustered_engine(GraphConfig::default()).await;

    assert!(engine.find_similar("query-a", 0).await.unwrap().is_empty());
    assert_eq!(engine.find_similar("query-a", 100).await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_find_similar_on_empty_graph_skips_embedding() {
    let engine = Engine::new(TableEmbedder::new(), GraphConfig::default()).unwrap();
    // unknown text would fail to embed; the empty graph answers first
    assert!(engine.find_similar("never embedded", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_similar_propagates_embedding_failure() {
    let engine = clustered_engine(GraphConfig::default()).await;
    let err = engine.find_similar("unknown text", 3).await.unwrap_err();
    assert!(matches!(err, Error::Embedding(EmbeddingFailure::Provider(_))));
}

#[tokio::test]
async fn test_query_without_tokens_matches_nothing() {
    let engine = Engine::new(HashingEmbedder::default(), GraphConfig::default()).unwrap();
    engine
        .build(&[TraceRecord::new("alpha beta", 0.9), TraceRecord::new("alpha beta gamma", 0.9)], 0.3)
        .await
        .unwrap();
    assert_eq!(engine.stats().total_edges, 1);

    for query in ["", "?!", "  ...  "] {
        assert!(engine.find_similar(query, 3).await.unwrap().is_empty(), "{query:?}");
        assert!(engine.insight_paths(query, 3).await.unwrap().is_empty(), "{query:?}");
    }
}

// ============================================================================
// 2. Centrality
// ============================================================================

#[tokio::test]
async fn test_central_nodes_on_star() {
    let engine = Engine::new(TableEmbedder::new(), GraphConfig::default()).unwrap();
    engine.build(&two_clusters(), 0.5).await.unwrap();
    let mut graph = engine.snapshot();
    // bridge the clusters through a0, making it the hub
    graph.add_edge(NodeId(0), NodeId(3), 0.2).unwrap();
    let engine = Engine::with_graph(TableEmbedder::new(), GraphConfig::default(), graph).unwrap();

    let top = engine.central_nodes(1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, NodeId(0));
    assert!((top[0].score - 3.0 / 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_central_nodes_bounds_and_empty() {
    let engine = clustered_engine(GraphConfig::default()).await;
    assert!(engine.central_nodes(0).is_empty());
    assert_eq!(engine.central_nodes(50).len(), 6);

    engine.clear();
    assert!(engine.central_nodes(5).is_empty());
}

#[tokio::test]
async fn test_betweenness_measure_selectable() {
    let config = GraphConfig::default().with_centrality(CentralityMeasure::Betweenness);
    let engine = clustered_engine(config).await;
    // two disjoint triangles: nobody lies on a shortest path
    for hit in engine.central_nodes(6) {
        assert_eq!(hit.score, 0.0);
    }
}

// ============================================================================
// 3. Communities
// ============================================================================

#[tokio::test]
async fn test_communities_split_clusters() {
    let engine = clustered_engine(GraphConfig::default()).await;
    let communities = engine.communities();

    assert_eq!(
        communities.groups,
        vec![
            vec![NodeId(0), NodeId(1), NodeId(2)],
            vec![NodeId(3), NodeId(4), NodeId(5)],
        ]
    );
    assert!(communities.modularity > 0.0);
    assert_eq!(communities.community_of(NodeId(4)), Some(1));
}

#[tokio::test]
async fn test_communities_on_empty_graph() {
    let engine = Engine::new(TableEmbedder::new(), GraphConfig::default()).unwrap();
    assert!(engine.communities().is_empty());
}

// ============================================================================
// 4. Insight paths
// ============================================================================

#[tokio::test]
async fn test_insight_paths_stay_within_cluster() {
    let engine = clustered_engine(GraphConfig::default()).await;
    let insights = engine.insight_paths("query-b", 3).await.unwrap();

    assert!(!insights.is_empty());
    for insight in &insights {
        assert_eq!(insight.query, "query-b");
        assert!(insight.path.len() >= 2);
        assert!(insight.path.len() <= engine.config().max_path_nodes);
        assert!(insight.path.iter().all(|id| id.0 >= 3));
        assert_eq!(insight.path.len(), insight.path_contents.len());
        assert!(insight.insight.starts_with("Connection: b"));
    }
    assert_eq!(insights[0].path[0], NodeId(3));
}

#[tokio::test]
async fn test_insight_paths_below_similarity_floor() {
    let engine = clustered_engine(GraphConfig::default()).await;
    // every node is orthogonal or opposite to this query
    assert!(engine.insight_paths("query-none", 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_insight_paths_on_empty_graph() {
    let engine = Engine::new(TableEmbedder::new(), GraphConfig::default()).unwrap();
    assert!(engine.insight_paths("query-a", 3).await.unwrap().is_empty());
}

// ============================================================================
// 5. Traversal
// ============================================================================

#[tokio::test]
async fn test_neighbors_and_shortest_path() {
    let engine = clustered_engine(GraphConfig::default()).await;

    assert_eq!(engine.neighbors(NodeId(0), 1).unwrap(), vec![NodeId(1), NodeId(2)]);
    assert!(engine.neighbors(NodeId(0), 0).unwrap().is_empty());
    assert!(matches!(engine.neighbors(NodeId(99), 1), Err(Error::UnknownNode(NodeId(99)))));

    assert_eq!(
        engine.shortest_path(NodeId(0), NodeId(2)).unwrap(),
        Some(vec![NodeId(0), NodeId(2)])
    );
    assert_eq!(engine.shortest_path(NodeId(0), NodeId(3)).unwrap(), None);
}

#[tokio::test]
async fn test_stats_for_two_triangles() {
    let engine = clustered_engine(GraphConfig::default()).await;
    let stats = engine.stats();

    assert_eq!(stats.total_nodes, 6);
    assert_eq!(stats.total_edges, 6);
    assert!((stats.density - 6.0 / 15.0).abs() < 1e-9);
    assert!((stats.avg_clustering - 1.0).abs() < 1e-9);
    assert!(!stats.is_connected);
    assert_eq!(stats.num_components, 2);
}

// ============================================================================
// 6. Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_readers() {
    let engine = clustered_engine(GraphConfig::default()).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                let communities = engine.communities();
                let central = engine.central_nodes(3);
                (communities.len(), central.len(), engine.stats().total_edges)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (2, 3, 6));
    }
}
