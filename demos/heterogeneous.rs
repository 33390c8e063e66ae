//! Heterogeneous import with a custom controller
//!
//! Node ids look like `student:101`; the controller maps the prefix to a
//! collection and the suffix to a key, and routes edges by weight.
//!
//! Run with: `cargo run --example heterogeneous`

use std::collections::BTreeSet;
use tracing_subscriber::EnvFilter;
use trueno_arango::{
    Adapter, AdapterError, Controller, CsrGraph, EdgeDefinition, GraphNodeId, ImportConfig,
    MemoryDatabase, NodeRecord, Result,
};

struct Campus;

impl Controller for Campus {
    fn identify_graph_node_collection(
        &self,
        node_id: &GraphNodeId,
        known: &BTreeSet<String>,
    ) -> Result<String> {
        let id = node_id.to_string();
        match id.split_once(':') {
            Some((collection, _)) if known.contains(collection) => Ok(collection.to_string()),
            Some((collection, _)) => Err(AdapterError::UnknownCollection(collection.to_string())),
            None => Err(AdapterError::malformed_id(id, "expected prefix:key")),
        }
    }

    fn derive_database_key(&self, node_id: &GraphNodeId, _collection: &str) -> Result<String> {
        let id = node_id.to_string();
        id.split_once(':')
            .map(|(_, key)| key.to_string())
            .ok_or_else(|| AdapterError::malformed_id(id.clone(), "expected prefix:key"))
    }

    fn identify_graph_edge_collection(
        &self,
        from: &NodeRecord,
        _to: &NodeRecord,
        _known: &BTreeSet<String>,
        weight: Option<f64>,
    ) -> Result<String> {
        Ok(match (from.database_collection.as_str(), weight) {
            ("student", _) => "attends",
            (_, Some(w)) if w > 1.0 => "leads",
            _ => "teaches",
        }
        .to_string())
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    println!("🦀 trueno-arango heterogeneous import\n");

    let mut graph = CsrGraph::new();
    graph.add_edge("professor:7".into(), "course:rust".into(), Some(2.0))?;
    graph.add_edge("professor:7".into(), "course:sql".into(), Some(1.0))?;
    graph.add_edge("student:101".into(), "course:rust".into(), Some(1.0))?;
    graph.add_edge("student:102".into(), "course:rust".into(), Some(1.0))?;

    let definitions = [
        EdgeDefinition::new("teaches", ["professor"], ["course"]),
        EdgeDefinition::new("leads", ["professor"], ["course"]),
        EdgeDefinition::new("attends", ["student"], ["course"]),
    ];

    let db = MemoryDatabase::new();
    let report = Adapter::with_controller(&db, Campus).graph_to_arangodb(
        "Campus",
        &graph,
        Some(&definitions),
        &ImportConfig {
            keyify_nodes: true,
            ..ImportConfig::default()
        },
    )?;

    for (collection, count) in report.vertices.iter().chain(&report.edges) {
        println!("  {collection}: {count}");
    }
    for edge in db.documents("attends") {
        println!("  attends: {} → {}", edge["_from"], edge["_to"]);
    }

    // Without the controller the ids are not collection/key
    let fresh = MemoryDatabase::new();
    if let Err(err) = Adapter::new(&fresh).graph_to_arangodb(
        "Campus",
        &graph,
        Some(&definitions),
        &ImportConfig::default(),
    ) {
        println!("\n  default controller: {err}");
    }

    Ok(())
}
