//! Round trip: database graph → CSR → new database
//!
//! Run with: `cargo run --example round_trip`
//! Set `RUST_LOG=debug` to see per-batch progress.

use serde_json::json;
use std::collections::BTreeSet;
use tracing_subscriber::EnvFilter;
use trueno_arango::{
    Adapter, CollectionKind, CsrGraph, Database, EdgeDefinition, ExportOptions, GraphDefinition,
    ImportConfig, LibraryGraph, MemoryDatabase,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    println!("🦀 trueno-arango round trip\n");

    // 1. A small social graph in the database
    let source = MemoryDatabase::new();
    let people = ["ada", "grace", "linus", "ken"]
        .iter()
        .filter_map(|name| json!({ "_key": name }).as_object().cloned())
        .collect();
    source.seed("people", CollectionKind::Document, people)?;

    let knows = [("ada", "grace", 3.0), ("grace", "linus", 1.0), ("ada", "linus", 0.5)]
        .iter()
        .filter_map(|(a, b, w)| {
            json!({ "_from": format!("people/{a}"), "_to": format!("people/{b}"), "weight": w })
                .as_object()
                .cloned()
        })
        .collect();
    source.seed("knows", CollectionKind::Edge, knows)?;
    source.create_graph(&GraphDefinition {
        name: "Social".to_string(),
        edge_definitions: vec![EdgeDefinition::new("knows", ["people"], ["people"])],
        orphan_collections: BTreeSet::new(),
    })?;

    // 2. Export to CSR
    let graph: CsrGraph =
        Adapter::new(&source).arangodb_graph_to_graph("Social", &ExportOptions::default())?;
    println!(
        "  ✅ Exported: {} nodes, {} edges",
        graph.num_nodes(),
        graph.num_edges()
    );
    let ids = graph.node_ids();
    for (src, dst, weight) in graph.iter_edges() {
        println!("    {} → {} ({weight})", ids[src as usize], ids[dst as usize]);
    }

    // 3. Import into an empty database
    let target = MemoryDatabase::new();
    let definitions = [EdgeDefinition::new("knows", ["people"], ["people"])];
    let report = Adapter::new(&target).graph_to_arangodb(
        "Social",
        &graph,
        Some(&definitions),
        &ImportConfig {
            batch_size: Some(2),
            ..ImportConfig::default()
        },
    )?;
    println!("\n  ✅ Imported in {} batches", report.batches);
    for (collection, count) in report.vertices.iter().chain(&report.edges) {
        println!("    {collection}: {count}");
    }

    // ken has no edges but survives the trip
    println!(
        "\n  people/ken present: {}",
        target.get("people", "ken").is_some()
    );

    Ok(())
}
