//! Property-based tests for trueno-arango
//!
//! Verifies CSR invariants for arbitrary edge lists and identifier
//! preservation across both conversion directions

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashSet};
use trueno_arango::storage::NodeIndex;
use trueno_arango::{
    ids, Adapter, CollectionKind, CsrGraph, Database, Document, EdgeDefinition, EdgeList, EdgeListBuilder,
    ExportOptions, GraphNodeId, GraphType, ImportConfig, LibraryGraph, MemoryDatabase, Verbosity,
};

// Property: from_edge_list should produce valid CSR structure
proptest! {
    #[test]
    fn prop_from_edge_list_valid_csr(edges in prop_edge_list(0usize..100usize, 0u32..50u32)) {
        let graph = CsrGraph::from_edge_list(&[], &edge_list(&edges), GraphType::default()).unwrap();
        let (row_offsets, col_indices, edge_weights) = graph.csr_components();

        // Invariant 1: row_offsets is monotonically increasing
        for pair in row_offsets.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }

        // Invariant 2: last row_offset == num_edges
        prop_assert_eq!(*row_offsets.last().unwrap() as usize, col_indices.len());

        // Invariant 3: col_indices and edge_weights have same length
        prop_assert_eq!(col_indices.len(), edge_weights.len());

        // Invariant 4: multigraph keeps every edge
        prop_assert_eq!(graph.num_edges(), edges.len());
    }
}

// Property: one node per unique id, isolated nodes included
proptest! {
    #[test]
    fn prop_one_node_per_unique_id(
        edges in prop_edge_list(0usize..60usize, 0u32..30u32),
        isolated in prop::collection::vec(100u32..120, 0..10),
    ) {
        let nodes: Vec<GraphNodeId> = isolated.iter().map(|i| node(*i)).collect();
        let graph = CsrGraph::from_edge_list(&nodes, &edge_list(&edges), GraphType::default()).unwrap();

        let expected: HashSet<GraphNodeId> = edges
            .iter()
            .flat_map(|(s, d, _)| [node(*s), node(*d)])
            .chain(nodes.iter().cloned())
            .collect();
        let ids = graph.node_ids();
        let unique: HashSet<GraphNodeId> = ids.iter().cloned().collect();

        prop_assert_eq!(ids.len(), unique.len());
        prop_assert_eq!(unique, expected);
    }
}

// Property: outgoing and incoming neighbors agree with the edge list
proptest! {
    #[test]
    fn prop_neighbors_correct(edges in prop_edge_list(0usize..100usize, 0u32..20u32)) {
        let graph = CsrGraph::from_edge_list(&[], &edge_list(&edges), GraphType::default()).unwrap();

        for idx in 0..graph.num_nodes() {
            let n = NodeIndex(u32::try_from(idx).unwrap());
            let id = graph.node_id(n).unwrap().clone();

            let mut outgoing: Vec<GraphNodeId> = graph
                .outgoing_neighbors(n)
                .unwrap()
                .iter()
                .map(|&d| graph.node_id(NodeIndex(d)).unwrap().clone())
                .collect();
            let mut expected: Vec<GraphNodeId> = edges
                .iter()
                .filter(|(s, _, _)| node(*s) == id)
                .map(|(_, d, _)| node(*d))
                .collect();
            outgoing.sort();
            expected.sort();
            prop_assert_eq!(outgoing, expected);

            let mut incoming: Vec<GraphNodeId> = graph
                .incoming_neighbors(n)
                .unwrap()
                .iter()
                .map(|&s| graph.node_id(NodeIndex(s)).unwrap().clone())
                .collect();
            let mut expected: Vec<GraphNodeId> = edges
                .iter()
                .filter(|(_, d, _)| node(*d) == id)
                .map(|(s, _, _)| node(*s))
                .collect();
            incoming.sort();
            expected.sort();
            prop_assert_eq!(incoming, expected);
        }
    }
}

// Property: a simple graph never holds parallel edges
proptest! {
    #[test]
    fn prop_simple_graph_dedupes(edges in prop_edge_list(0usize..100usize, 0u32..10u32)) {
        let graph_type = GraphType { directed: true, multigraph: false };
        let graph = CsrGraph::from_edge_list(&[], &edge_list(&edges), graph_type).unwrap();

        let pairs: HashSet<(u32, u32)> = edges.iter().map(|(s, d, _)| (*s, *d)).collect();
        prop_assert_eq!(graph.num_edges(), pairs.len());
    }
}

// Property: collection/key ids survive database → graph → database
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_round_trip_preserves_ids(
        keys in prop::collection::btree_set("[a-zA-Z0-9_-]{1,12}", 1..20),
        picks in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 0..30),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let source = MemoryDatabase::new();
        source
            .seed(
                "numbers",
                CollectionKind::Document,
                keys.iter().map(|k| doc(json!({ "_key": k }))).collect(),
            )
            .unwrap();
        let edges: Vec<Document> = picks
            .iter()
            .map(|(a, b)| {
                doc(json!({
                    "_from": format!("numbers/{}", a.get(&keys)),
                    "_to": format!("numbers/{}", b.get(&keys)),
                }))
            })
            .collect();
        source.seed("links", CollectionKind::Edge, edges).unwrap();

        let vertex_cols: BTreeSet<String> = ["numbers".to_string()].into();
        let edge_cols: BTreeSet<String> = ["links".to_string()].into();
        let export = ExportOptions { verbosity: Verbosity::Silent, ..ExportOptions::default() };
        let graph: CsrGraph = Adapter::new(&source)
            .arangodb_collections_to_graph("g", &vertex_cols, &edge_cols, &export)
            .unwrap();
        prop_assert_eq!(graph.num_nodes(), keys.len());

        let target = MemoryDatabase::new();
        let definitions = [EdgeDefinition::new("links", ["numbers"], ["numbers"])];
        let config = ImportConfig { verbosity: Verbosity::Silent, ..ImportConfig::default() };
        Adapter::new(&target)
            .graph_to_arangodb("g", &graph, Some(&definitions), &config)
            .unwrap();

        let ids_of = |db: &MemoryDatabase| -> BTreeSet<String> {
            db.documents("numbers")
                .iter()
                .map(|d| d["_id"].as_str().unwrap().to_string())
                .collect()
        };
        prop_assert_eq!(ids_of(&source), ids_of(&target));
        prop_assert_eq!(target.count("links").unwrap(), picks.len());
    }
}

// Property: decompose inverts compose for valid parts
proptest! {
    #[test]
    fn prop_compose_decompose(collection in "[a-zA-Z][a-zA-Z0-9_]{0,20}", key in "[a-zA-Z0-9_:.@-]{1,40}") {
        let id = ids::compose(&collection, &key);
        prop_assert_eq!(ids::decompose(&id).unwrap(), (collection.as_str(), key.as_str()));
        prop_assert!(ids::is_valid_key(&key));
    }
}

fn node(i: u32) -> GraphNodeId {
    GraphNodeId::from(format!("v/{i}"))
}

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn edge_list(edges: &[(u32, u32, f64)]) -> EdgeList {
    let mut builder = EdgeListBuilder::weighted("weight");
    for (s, d, w) in edges {
        builder.push(node(*s), node(*d), Some(*w));
    }
    builder.finish().unwrap()
}

// Helper: Generate arbitrary edge list
fn prop_edge_list(
    num_edges: impl Strategy<Value = usize>,
    max_node: impl Strategy<Value = u32>,
) -> impl Strategy<Value = Vec<(u32, u32, f64)>> {
    (num_edges, max_node).prop_flat_map(|(n, max_node)| {
        // Ensure max_node is at least 1 to avoid empty range
        let max_node = max_node.max(1);
        prop::collection::vec((0..max_node, 0..max_node, 0.0..100.0f64), 0..=n)
    })
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_empty_graph_invariants() {
        let graph = CsrGraph::new();

        let (row_offsets, col_indices, edge_weights) = graph.csr_components();

        assert_eq!(row_offsets, &[0]); // Single offset for empty graph
        assert_eq!(col_indices.len(), 0);
        assert_eq!(edge_weights.len(), 0);
        assert_eq!(graph.num_nodes(), 0);
        assert_eq!(graph.num_edges(), 0);
    }

    #[test]
    fn test_single_edge_invariants() {
        let graph =
            CsrGraph::from_edge_list(&[], &edge_list(&[(0, 1, 1.0)]), GraphType::default()).unwrap();

        let (row_offsets, col_indices, edge_weights) = graph.csr_components();

        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(row_offsets, &[0, 1, 1]);
        assert_eq!(col_indices, &[1]);
        assert_eq!(edge_weights, &[1.0]);
    }
}
