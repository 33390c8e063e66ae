//! Database → graph-library conversion
//!
//! Vertices are exported first so that vertices without incident edges still
//! become nodes; edges are then appended to one edge-list table whose
//! endpoints are the `_from`/`_to` ids verbatim. The graph is built in a
//! single pass at the end, so a failure anywhere yields no graph at all.

use super::Adapter;
use crate::controller::Controller;
use crate::database::{Database, QueryOptions};
use crate::document::{self, Document, DEFAULT_WEIGHT};
use crate::error::{AdapterError, Result};
use crate::ids::GraphNodeId;
use crate::progress::{Progress, Verbosity, DEFAULT_BATCH};
use crate::schema::{EdgeDefinition, Metagraph};
use crate::storage::{EdgeListBuilder, GraphType, LibraryGraph};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Options for database → graph conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Directedness and multi-edge support of the built graph
    pub graph_type: GraphType,
    /// Passed through to every collection query
    pub query: QueryOptions,
    /// Edge attribute read as the weight
    pub edge_attr: String,
    /// Progress reporting
    pub verbosity: Verbosity,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            graph_type: GraphType::default(),
            query: QueryOptions::default(),
            edge_attr: DEFAULT_WEIGHT.to_string(),
            verbosity: Verbosity::default(),
        }
    }
}

/// Node set in first-seen order, one entry per unique id
#[derive(Default)]
struct NodeSet {
    order: Vec<GraphNodeId>,
    seen: HashSet<GraphNodeId>,
}

impl NodeSet {
    fn insert(&mut self, id: GraphNodeId) {
        if self.seen.insert(id.clone()) {
            self.order.push(id);
        }
    }
}

impl<D: Database + ?Sized, C: Controller> Adapter<'_, D, C> {
    /// Export the collections of a metagraph
    ///
    /// Attribute sets are used as query projections; identity attributes are
    /// always fetched, and edge projections also fetch `edge_attr`.
    ///
    /// # Errors
    ///
    /// `UnknownCollection`, `MalformedIdentifier`, `MalformedEdge`, database
    /// and graph construction errors. No graph is returned on failure.
    pub fn arangodb_to_graph<G: LibraryGraph>(
        &self,
        name: &str,
        metagraph: &Metagraph,
        options: &ExportOptions,
    ) -> Result<G> {
        for collection in metagraph
            .vertex_collections
            .keys()
            .chain(metagraph.edge_collections.keys())
        {
            self.require_collection(collection)?;
        }
        if options.verbosity >= Verbosity::Info {
            info!(
                graph = name,
                vertex_collections = metagraph.vertex_collections.len(),
                edge_collections = metagraph.edge_collections.len(),
                "exporting to graph"
            );
        }

        let mut nodes = NodeSet::default();
        for (collection, attributes) in &metagraph.vertex_collections {
            self.export_vertices(collection, attributes, options, &mut nodes)?;
        }

        let mut edges = EdgeListBuilder::weighted(options.edge_attr.clone());
        for (collection, attributes) in &metagraph.edge_collections {
            let mut projection = attributes.clone();
            if !projection.is_empty() {
                projection.insert(options.edge_attr.clone());
            }
            self.export_edges(collection, &projection, options, &mut edges)?;
        }

        let edge_list = edges.finish().map_err(AdapterError::Graph)?;
        let graph = G::from_edge_list(&nodes.order, &edge_list, options.graph_type)
            .map_err(AdapterError::Graph)?;

        if options.verbosity >= Verbosity::Info {
            info!(
                graph = name,
                nodes = nodes.order.len(),
                edges = edge_list.len(),
                "graph built"
            );
        }
        Ok(graph)
    }

    /// Export explicit vertex and edge collections
    ///
    /// Every vertex collection is treated as a valid endpoint for every edge
    /// collection.
    ///
    /// # Errors
    ///
    /// See [`arangodb_to_graph`](Self::arangodb_to_graph)
    pub fn arangodb_collections_to_graph<G: LibraryGraph>(
        &self,
        name: &str,
        vertex_collections: &BTreeSet<String>,
        edge_collections: &BTreeSet<String>,
        options: &ExportOptions,
    ) -> Result<G> {
        if options.verbosity.is_debug() {
            let definitions = EdgeDefinition::synthesize(vertex_collections, edge_collections);
            debug!(graph = name, ?definitions, "synthesized edge definitions");
        }

        let metagraph = Metagraph::from_collections(vertex_collections, edge_collections);
        self.arangodb_to_graph(name, &metagraph, options)
    }

    /// Export a named graph (edge definitions plus orphan collections)
    ///
    /// # Errors
    ///
    /// `UnknownGraph` if the graph does not exist; otherwise see
    /// [`arangodb_to_graph`](Self::arangodb_to_graph)
    pub fn arangodb_graph_to_graph<G: LibraryGraph>(
        &self,
        name: &str,
        options: &ExportOptions,
    ) -> Result<G> {
        let graph = self
            .db
            .graph(name)
            .map_err(AdapterError::Database)?
            .ok_or_else(|| AdapterError::UnknownGraph(name.to_string()))?;

        self.arangodb_collections_to_graph(
            name,
            &graph.vertex_collections(),
            &graph.edge_collections(),
            options,
        )
    }

    fn export_vertices(
        &self,
        collection: &str,
        attributes: &BTreeSet<String>,
        options: &ExportOptions,
        nodes: &mut NodeSet,
    ) -> Result<()> {
        let total = self.db.count(collection).map_err(AdapterError::Database)?;
        let mut progress = Progress::start(
            options.verbosity,
            "export",
            collection,
            Some(total),
            options.query.batch_size.unwrap_or(DEFAULT_BATCH),
        );

        for doc in self.stream(collection, attributes, &options.query)? {
            let vertex = self
                .controller
                .prepare_database_vertex(doc.map_err(AdapterError::Database)?, collection)?;
            let id = document::str_field(&vertex, document::ID).ok_or_else(|| {
                AdapterError::malformed_id(
                    vertex.get(document::ID).map_or_else(String::new, Value::to_string),
                    format!("vertex in '{collection}' has no string _id"),
                )
            })?;
            if options.verbosity.is_debug() {
                debug!(collection, id, "vertex");
            }
            nodes.insert(GraphNodeId::from(id));
            progress.advance(1);
        }

        progress.finish();
        Ok(())
    }

    fn export_edges(
        &self,
        collection: &str,
        projection: &BTreeSet<String>,
        options: &ExportOptions,
        edges: &mut EdgeListBuilder,
    ) -> Result<()> {
        let total = self.db.count(collection).map_err(AdapterError::Database)?;
        edges.reserve(total);
        let mut progress = Progress::start(
            options.verbosity,
            "export",
            collection,
            Some(total),
            options.query.batch_size.unwrap_or(DEFAULT_BATCH),
        );

        for doc in self.stream(collection, projection, &options.query)? {
            let edge = self
                .controller
                .prepare_database_edge(doc.map_err(AdapterError::Database)?, collection)?;
            let (from, to, weight) = edge_row(&edge, collection, &options.edge_attr)?;
            if options.verbosity.is_debug() {
                debug!(collection, from, to, weight, "edge");
            }
            edges.push(GraphNodeId::from(from), GraphNodeId::from(to), Some(weight));
            progress.advance(1);
        }

        progress.finish();
        Ok(())
    }
}

fn edge_row<'d>(
    edge: &'d Document,
    collection: &str,
    weight_attr: &str,
) -> Result<(&'d str, &'d str, f64)> {
    let endpoint = |field: &str| {
        document::str_field(edge, field).ok_or_else(|| {
            AdapterError::malformed_edge(
                collection,
                format!(
                    "missing or non-string {field} in {}",
                    document::str_field(edge, document::ID).unwrap_or("<no _id>")
                ),
            )
        })
    };
    let from = endpoint(document::FROM)?;
    let to = endpoint(document::TO)?;

    let weight = match edge.get(weight_attr) {
        None | Some(Value::Null) => 0.0,
        Some(value) => value.as_f64().ok_or_else(|| {
            AdapterError::malformed_edge(
                collection,
                format!("non-numeric {weight_attr} on {from} -> {to}"),
            )
        })?,
    };

    Ok((from, to, weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Document::new(),
        }
    }

    #[test]
    fn test_edge_row_defaults_weight() {
        let edge = doc(json!({"_from": "a/1", "_to": "a/2"}));
        assert_eq!(edge_row(&edge, "e", "weight").unwrap(), ("a/1", "a/2", 0.0));

        let edge = doc(json!({"_from": "a/1", "_to": "a/2", "w": 2.5}));
        assert_eq!(edge_row(&edge, "e", "w").unwrap().2, 2.5);
    }

    #[test]
    fn test_edge_row_missing_endpoint() {
        let edge = doc(json!({"_id": "e/1", "_from": "a/1"}));
        let err = edge_row(&edge, "e", "weight").unwrap_err();
        assert!(matches!(err, AdapterError::MalformedEdge { ref collection, .. } if collection == "e"));
    }

    #[test]
    fn test_edge_row_rejects_non_numeric_weight() {
        let edge = doc(json!({"_from": "a/1", "_to": "a/2", "weight": "heavy"}));
        assert!(matches!(
            edge_row(&edge, "e", "weight"),
            Err(AdapterError::MalformedEdge { .. })
        ));
    }

    #[test]
    fn test_export_options_from_json() {
        let opts: ExportOptions = serde_json::from_value(json!({
            "graph_type": {"directed": false},
            "verbosity": "silent",
        }))
        .unwrap();
        assert!(!opts.graph_type.directed);
        assert!(opts.graph_type.multigraph);
        assert_eq!(opts.edge_attr, "weight");
        assert_eq!(opts.verbosity, Verbosity::Silent);
    }
}
