//! Graph-library → database conversion
//!
//! Four stages, each fully materialised before the next:
//!
//! 1. ensure the target graph and its collections exist
//! 2. resolve every node to a collection and key (O(V) lookup table)
//! 3. resolve every edge to an edge collection via its endpoint records
//! 4. flush per-collection batches through bulk import
//!
//! Import is not transactional: when a batch fails, batches flushed before it
//! stay in the database.

use super::Adapter;
use crate::controller::{Controller, NodeRecord};
use crate::database::{Database, ImportOptions, ImportSummary};
use crate::document::{self, Document, DEFAULT_WEIGHT};
use crate::error::{AdapterError, Result};
use crate::ids::{self, GraphNodeId};
use crate::progress::{Progress, Verbosity};
use crate::schema::{
    same_definitions, vertex_collections, CollectionKind, EdgeDefinition, GraphDefinition,
};
use crate::storage::LibraryGraph;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Options for graph → database conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Derive node keys with [`Controller::derive_database_key`]
    pub keyify_nodes: bool,
    /// Derive edge keys with [`Controller::derive_edge_key`]
    pub keyify_edges: bool,
    /// Edge attribute the graph weight is stored under; `None` drops weights
    pub edge_attr: Option<String>,
    /// Replace an existing graph whose edge definitions differ
    pub overwrite_graph: bool,
    /// Extra vertex collections outside any edge definition
    pub orphan_collections: BTreeSet<String>,
    /// Documents per bulk-import call; `None` imports each collection in one call
    pub batch_size: Option<usize>,
    /// Passed through to every bulk-import call
    pub import: ImportOptions,
    /// Progress reporting
    pub verbosity: Verbosity,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            keyify_nodes: false,
            keyify_edges: false,
            edge_attr: Some(DEFAULT_WEIGHT.to_string()),
            overwrite_graph: false,
            orphan_collections: BTreeSet::new(),
            batch_size: None,
            import: ImportOptions::default(),
            verbosity: Verbosity::default(),
        }
    }
}

/// What a graph → database conversion wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Target graph name
    pub graph: String,
    /// Vertex documents per collection
    pub vertices: BTreeMap<String, usize>,
    /// Edge documents per collection
    pub edges: BTreeMap<String, usize>,
    /// Bulk-import calls made
    pub batches: usize,
    /// Summed database import results
    pub summary: ImportSummary,
}

impl<D: Database + ?Sized, C: Controller> Adapter<'_, D, C> {
    /// Write a graph-library graph into a database graph
    ///
    /// With `edge_definitions = None` the graph must already exist and its
    /// definitions and orphans are used as stored; `orphan_collections` and
    /// `overwrite_graph` only take effect when the graph is (re)created.
    /// Missing collections of the resolved graph are created on every path.
    ///
    /// # Errors
    ///
    /// `UnknownGraph`, `SchemaConflict`, `UnknownCollection`,
    /// `MalformedIdentifier`, `KeyDerivationRequired`,
    /// `AmbiguousEdgeCollection`, `EdgeRejected`, `Import`, database and graph
    /// errors, plus anything a controller hook returns
    pub fn graph_to_arangodb<G: LibraryGraph>(
        &self,
        name: &str,
        graph: &G,
        edge_definitions: Option<&[EdgeDefinition]>,
        config: &ImportConfig,
    ) -> Result<ImportReport> {
        let definition = self.ensure_graph(name, edge_definitions, config)?;
        let known_vertex_collections = definition.vertex_collections();
        let known_edge_collections = definition.edge_collections();
        let by_edge_collection: HashMap<&str, &EdgeDefinition> = definition
            .edge_definitions
            .iter()
            .map(|d| (d.edge_collection.as_str(), d))
            .collect();

        if config.verbosity >= Verbosity::Info {
            info!(
                graph = name,
                vertex_collections = known_vertex_collections.len(),
                edge_collections = known_edge_collections.len(),
                "importing graph"
            );
        }

        // Nodes
        let node_ids = graph.node_ids();
        let mut lookup: HashMap<GraphNodeId, NodeRecord> = HashMap::with_capacity(node_ids.len());
        let mut vertex_docs: BTreeMap<String, Vec<Document>> = BTreeMap::new();
        for node_id in node_ids {
            let record = self.resolve_node(node_id, &known_vertex_collections, config)?;

            let mut vertex = Document::new();
            vertex.insert(
                document::KEY.to_string(),
                Value::String(record.database_key.clone()),
            );
            let vertex = self
                .controller
                .prepare_graph_vertex(vertex, &record.database_collection)?;

            vertex_docs
                .entry(record.database_collection.clone())
                .or_default()
                .push(vertex);
            lookup.insert(record.graph_id.clone(), record);
        }

        // Edges
        let edge_list = graph.edge_list().map_err(AdapterError::Graph)?;
        let weighted = edge_list.weight_column().is_some();
        let weight_attr = config
            .edge_attr
            .as_deref()
            .filter(|attr| weighted && !attr.is_empty());
        let mut edge_docs: BTreeMap<String, Vec<Document>> = BTreeMap::new();

        for (i, row) in edge_list
            .rows()
            .map_err(AdapterError::Graph)?
            .into_iter()
            .enumerate()
        {
            let from = endpoint(&lookup, &row.src)?;
            let to = endpoint(&lookup, &row.dst)?;
            let weight = if weighted { row.weight } else { None };

            let collection = self.controller.identify_graph_edge_collection(
                from,
                to,
                &known_edge_collections,
                weight,
            )?;
            let edge_definition = by_edge_collection
                .get(collection.as_str())
                .ok_or_else(|| AdapterError::UnknownCollection(collection.clone()))?;
            if !edge_definition.permits(&from.database_collection, &to.database_collection) {
                return Err(AdapterError::EdgeRejected {
                    collection,
                    from: from.database_id.clone(),
                    to: to.database_id.clone(),
                });
            }

            let mut edge = Document::new();
            if config.keyify_edges {
                let key = self
                    .controller
                    .derive_edge_key(i + 1, from, to, &collection)?;
                edge.insert(document::KEY.to_string(), Value::String(key));
            }
            edge.insert(
                document::FROM.to_string(),
                Value::String(from.database_id.clone()),
            );
            edge.insert(document::TO.to_string(), Value::String(to.database_id.clone()));
            if let (Some(attr), Some(w)) = (weight_attr, weight) {
                let value = weight_value(w).ok_or_else(|| {
                    AdapterError::Graph(anyhow!(
                        "non-finite weight {w} on edge {} -> {}",
                        from.graph_id,
                        to.graph_id
                    ))
                })?;
                edge.insert(attr.to_string(), value);
            }
            let edge = self.controller.prepare_graph_edge(edge, &collection)?;

            if config.verbosity.is_debug() {
                debug!(
                    collection = collection.as_str(),
                    from = from.database_id.as_str(),
                    to = to.database_id.as_str(),
                    weight,
                    "edge"
                );
            }
            edge_docs.entry(collection).or_default().push(edge);
        }

        // Flush
        let mut report = ImportReport {
            graph: name.to_string(),
            ..ImportReport::default()
        };
        for (collection, docs) in &vertex_docs {
            self.flush(collection, docs, config, &mut report)?;
            report.vertices.insert(collection.clone(), docs.len());
        }
        for (collection, docs) in &edge_docs {
            self.flush(collection, docs, config, &mut report)?;
            report.edges.insert(collection.clone(), docs.len());
        }

        if config.verbosity >= Verbosity::Info {
            info!(
                graph = name,
                batches = report.batches,
                created = report.summary.created,
                "graph imported"
            );
        }
        Ok(report)
    }

    fn ensure_graph(
        &self,
        name: &str,
        edge_definitions: Option<&[EdgeDefinition]>,
        config: &ImportConfig,
    ) -> Result<GraphDefinition> {
        let existing = self.db.graph(name).map_err(AdapterError::Database)?;

        let Some(edge_definitions) = edge_definitions else {
            let graph = existing.ok_or_else(|| AdapterError::UnknownGraph(name.to_string()))?;
            self.ensure_collections(&graph, config.verbosity)?;
            return Ok(graph);
        };

        match existing {
            Some(graph) if same_definitions(&graph.edge_definitions, edge_definitions) => {
                self.ensure_collections(&graph, config.verbosity)?;
                return Ok(graph);
            }
            Some(_) if !config.overwrite_graph => {
                return Err(AdapterError::SchemaConflict {
                    graph: name.to_string(),
                });
            }
            Some(_) => {
                if config.verbosity >= Verbosity::Info {
                    warn!(graph = name, "replacing graph with new edge definitions");
                }
                self.db.delete_graph(name).map_err(AdapterError::Database)?;
            }
            None => {}
        }

        let wanted = GraphDefinition {
            name: name.to_string(),
            edge_definitions: edge_definitions.to_vec(),
            orphan_collections: config
                .orphan_collections
                .difference(&vertex_collections(edge_definitions))
                .cloned()
                .collect(),
        };

        self.ensure_collections(&wanted, config.verbosity)?;
        self.db.create_graph(&wanted).map_err(AdapterError::Database)?;
        Ok(wanted)
    }

    /// Create the vertex and edge collections of `graph` that do not exist yet
    fn ensure_collections(&self, graph: &GraphDefinition, verbosity: Verbosity) -> Result<()> {
        let collections = graph
            .vertex_collections()
            .into_iter()
            .map(|c| (c, CollectionKind::Document))
            .chain(
                graph
                    .edge_collections()
                    .into_iter()
                    .map(|c| (c, CollectionKind::Edge)),
            );
        for (collection, kind) in collections {
            if !self
                .db
                .has_collection(&collection)
                .map_err(AdapterError::Database)?
            {
                if verbosity.is_debug() {
                    debug!(collection = collection.as_str(), ?kind, "creating collection");
                }
                self.db
                    .create_collection(&collection, kind)
                    .map_err(AdapterError::Database)?;
            }
        }
        Ok(())
    }

    fn resolve_node(
        &self,
        node_id: GraphNodeId,
        known_vertex_collections: &BTreeSet<String>,
        config: &ImportConfig,
    ) -> Result<NodeRecord> {
        let collection = match single(known_vertex_collections) {
            Some(only) => only.clone(),
            None => self
                .controller
                .identify_graph_node_collection(&node_id, known_vertex_collections)?,
        };
        if !known_vertex_collections.contains(&collection) {
            return Err(AdapterError::UnknownCollection(collection));
        }

        let key = if config.keyify_nodes {
            self.controller.derive_database_key(&node_id, &collection)?
        } else {
            node_id
                .decompose()
                .map(|(_, key)| key.to_string())
                .map_err(|_| AdapterError::KeyDerivationRequired {
                    node: node_id.to_string(),
                })?
        };
        if !ids::is_valid_key(&key) {
            return Err(AdapterError::malformed_id(
                key,
                format!("invalid document key derived from node {node_id}"),
            ));
        }

        if config.verbosity.is_debug() {
            debug!(node = %node_id, collection = collection.as_str(), key = key.as_str(), "node");
        }
        Ok(NodeRecord::new(node_id, collection, key))
    }

    fn flush(
        &self,
        collection: &str,
        docs: &[Document],
        config: &ImportConfig,
        report: &mut ImportReport,
    ) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let batch_size = config.batch_size.unwrap_or(docs.len()).max(1);
        let mut progress = Progress::start(
            config.verbosity,
            "import",
            collection,
            Some(docs.len()),
            batch_size,
        );

        for (batch, chunk) in docs.chunks(batch_size).enumerate() {
            let summary = self
                .db
                .import_bulk(collection, chunk, &config.import)
                .map_err(|source| AdapterError::Import {
                    collection: collection.to_string(),
                    batch,
                    source,
                })?;
            report.batches += 1;
            report.summary.created += summary.created;
            report.summary.updated += summary.updated;
            report.summary.ignored += summary.ignored;
            progress.advance(chunk.len());
        }

        progress.finish();
        Ok(())
    }
}

/// JSON value for an edge weight: whole numbers as integers, `None` if not finite
#[allow(clippy::cast_possible_truncation)] // range checked before the cast
fn weight_value(w: f64) -> Option<Value> {
    if w.fract() == 0.0 && w.abs() < 9_007_199_254_740_992.0 {
        return Some(Value::Number(Number::from(w as i64)));
    }
    Number::from_f64(w).map(Value::Number)
}

fn single(set: &BTreeSet<String>) -> Option<&String> {
    let mut iter = set.iter();
    match (iter.next(), iter.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

fn endpoint<'a>(
    lookup: &'a HashMap<GraphNodeId, NodeRecord>,
    id: &GraphNodeId,
) -> Result<&'a NodeRecord> {
    lookup
        .get(id)
        .ok_or_else(|| AdapterError::Graph(anyhow!("edge endpoint {id} is not a graph node")))
}
