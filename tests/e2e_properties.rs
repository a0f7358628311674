//! Property tests over randomly generated trace batches.

use proptest::prelude::*;
use resonance_graph::export;
use resonance_graph::query::community::detect_communities;
use resonance_graph::{GraphBuilder, HashingEmbedder, KnowledgeGraph, QueryEngine, TraceRecord};

const WORDS: &[&str] = &[
    "awareness", "reflection", "memory", "emotion", "clarity", "joy", "error", "insight",
    "pattern", "attention",
];

fn trace_strategy() -> impl Strategy<Value = TraceRecord> {
    (prop::collection::vec(prop::sample::select(WORDS), 1..5), 0.0f32..=1.0)
        .prop_map(|(words, resonance)| TraceRecord::new(words.join(" "), resonance))
}

fn build(traces: &[TraceRecord], min_resonance: f32) -> KnowledgeGraph {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let embedder = HashingEmbedder::new(64);
    runtime
        .block_on(GraphBuilder::new(&embedder).build(traces, min_resonance))
        .unwrap()
        .graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_graph_is_well_formed(
        traces in prop::collection::vec(trace_strategy(), 0..14),
        min_resonance in 0.0f32..=1.0,
    ) {
        let graph = build(&traces, min_resonance);

        for node in graph.nodes() {
            prop_assert!(node.resonance >= min_resonance);
        }
        for edge in graph.edges() {
            prop_assert!(graph.contains(edge.source));
            prop_assert!(graph.contains(edge.target));
            prop_assert!(edge.source != edge.target);
            prop_assert!(edge.weight > 0.5 && edge.weight <= 1.0);
        }
        let admitted = traces.iter().filter(|t| t.resonance >= min_resonance).count();
        prop_assert_eq!(graph.node_count(), admitted);
    }

    #[test]
    fn prop_communities_partition_nodes(
        traces in prop::collection::vec(trace_strategy(), 0..14),
    ) {
        let graph = build(&traces, 0.0);
        let communities = detect_communities(&graph, false);

        let mut seen: Vec<_> = communities.groups.iter().flatten().copied().collect();
        seen.sort();
        prop_assert_eq!(seen, graph.node_ids());
        prop_assert!(communities.groups.iter().all(|g| !g.is_empty()));
        prop_assert!(communities.modularity >= -0.5 && communities.modularity <= 1.0);
    }

    #[test]
    fn prop_export_round_trip(
        traces in prop::collection::vec(trace_strategy(), 0..14),
    ) {
        let graph = build(&traces, 0.2);
        let back = export::from_json_str(&export::to_json_string(&graph).unwrap()).unwrap();
        prop_assert_eq!(back, graph);
    }

    #[test]
    fn prop_find_similar_is_bounded_and_sorted(
        traces in prop::collection::vec(trace_strategy(), 1..14),
        probe in prop::collection::vec(-1.0f32..1.0, 64),
        top_k in 0usize..20,
    ) {
        let graph = build(&traces, 0.0);
        let hits = QueryEngine::new(&graph).find_similar(&probe, top_k).unwrap();

        prop_assert!(hits.len() <= top_k.min(graph.node_count()));
        prop_assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        for hit in &hits {
            prop_assert!(graph.contains(hit.id));
        }
    }
}
