//! Conversion policy hooks
//!
//! A [`Controller`] is consulted at fixed points in both conversion
//! directions. Every hook has a default that covers homogeneous graphs whose
//! node ids are already document ids; heterogeneous targets override the
//! identification hooks.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use trueno_arango::{Controller, GraphNodeId, Result};
//!
//! /// Node ids look like `student:101`
//! struct ColonIds;
//!
//! impl Controller for ColonIds {
//!     fn identify_graph_node_collection(
//!         &self,
//!         node_id: &GraphNodeId,
//!         _known: &BTreeSet<String>,
//!     ) -> Result<String> {
//!         let id = node_id.to_string();
//!         Ok(id.split_once(':').map_or(id.clone(), |(c, _)| c.to_string()))
//!     }
//! }
//! ```

use crate::document::Document;
use crate::error::{AdapterError, Result};
use crate::ids::{self, GraphNodeId};
use std::collections::BTreeSet;

/// Graph node enriched with its database identity
///
/// Built once per node during import and looked up per edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Graph-library node id
    pub graph_id: GraphNodeId,
    /// Database document id (`collection/key`)
    pub database_id: String,
    /// Database vertex collection
    pub database_collection: String,
    /// Database document key
    pub database_key: String,
}

impl NodeRecord {
    /// Build a record from a node id, collection and key
    #[must_use]
    pub fn new(graph_id: GraphNodeId, collection: String, key: String) -> Self {
        Self {
            graph_id,
            database_id: ids::compose(&collection, &key),
            database_collection: collection,
            database_key: key,
        }
    }
}

/// Policy hooks for both conversion directions
pub trait Controller {
    /// Transform a vertex before its `_id` becomes a graph node id
    ///
    /// # Errors
    ///
    /// Implementations may reject the document
    fn prepare_database_vertex(&self, vertex: Document, _collection: &str) -> Result<Document> {
        Ok(vertex)
    }

    /// Transform an edge before it is appended to the edge list
    ///
    /// # Errors
    ///
    /// Implementations may reject the document
    fn prepare_database_edge(&self, edge: Document, _collection: &str) -> Result<Document> {
        Ok(edge)
    }

    /// Vertex collection a graph node belongs to
    ///
    /// Not consulted when only one vertex collection is known.
    ///
    /// # Errors
    ///
    /// Default fails if the id does not decompose or names an unknown collection
    fn identify_graph_node_collection(
        &self,
        node_id: &GraphNodeId,
        known_vertex_collections: &BTreeSet<String>,
    ) -> Result<String> {
        let (collection, _) = node_id.decompose()?;
        if known_vertex_collections.contains(collection) {
            Ok(collection.to_string())
        } else {
            Err(AdapterError::UnknownCollection(collection.to_string()))
        }
    }

    /// Database key for a graph node (only called with `keyify_nodes`)
    ///
    /// # Errors
    ///
    /// Default fails if the id neither decomposes nor is a valid key itself
    fn derive_database_key(&self, node_id: &GraphNodeId, _collection: &str) -> Result<String> {
        if let Ok((_, key)) = node_id.decompose() {
            return Ok(key.to_string());
        }
        let raw = node_id.to_string();
        if ids::is_valid_key(&raw) {
            Ok(raw)
        } else {
            Err(AdapterError::malformed_id(
                raw,
                "not in collection/key form and not a valid document key",
            ))
        }
    }

    /// Edge collection an edge belongs to
    ///
    /// # Errors
    ///
    /// Default fails with `AmbiguousEdgeCollection` unless exactly one edge
    /// collection is declared
    fn identify_graph_edge_collection(
        &self,
        from: &NodeRecord,
        to: &NodeRecord,
        known_edge_collections: &BTreeSet<String>,
        _weight: Option<f64>,
    ) -> Result<String> {
        let mut cols = known_edge_collections.iter();
        match (cols.next(), cols.next()) {
            (Some(only), None) => Ok(only.clone()),
            _ => Err(AdapterError::AmbiguousEdgeCollection {
                from: from.graph_id.to_string(),
                to: to.graph_id.to_string(),
                candidates: known_edge_collections.iter().cloned().collect(),
            }),
        }
    }

    /// Edge document key (only called with `keyify_edges`)
    ///
    /// `index` is 1-based within the whole edge list.
    ///
    /// # Errors
    ///
    /// Implementations may fail to derive a key
    fn derive_edge_key(
        &self,
        index: usize,
        _from: &NodeRecord,
        _to: &NodeRecord,
        _collection: &str,
    ) -> Result<String> {
        Ok(index.to_string())
    }

    /// Last transform of a vertex document before bulk import
    ///
    /// # Errors
    ///
    /// Implementations may reject the document
    fn prepare_graph_vertex(&self, vertex: Document, _collection: &str) -> Result<Document> {
        Ok(vertex)
    }

    /// Last transform of an edge document before bulk import
    ///
    /// # Errors
    ///
    /// Implementations may reject the document
    fn prepare_graph_edge(&self, edge: Document, _collection: &str) -> Result<Document> {
        Ok(edge)
    }
}

/// Controller using every default hook
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultController;

impl Controller for DefaultController {}

impl<C: Controller + ?Sized> Controller for &C {
    fn prepare_database_vertex(&self, vertex: Document, collection: &str) -> Result<Document> {
        (**self).prepare_database_vertex(vertex, collection)
    }

    fn prepare_database_edge(&self, edge: Document, collection: &str) -> Result<Document> {
        (**self).prepare_database_edge(edge, collection)
    }

    fn identify_graph_node_collection(
        &self,
        node_id: &GraphNodeId,
        known_vertex_collections: &BTreeSet<String>,
    ) -> Result<String> {
        (**self).identify_graph_node_collection(node_id, known_vertex_collections)
    }

    fn derive_database_key(&self, node_id: &GraphNodeId, collection: &str) -> Result<String> {
        (**self).derive_database_key(node_id, collection)
    }

    fn identify_graph_edge_collection(
        &self,
        from: &NodeRecord,
        to: &NodeRecord,
        known_edge_collections: &BTreeSet<String>,
        weight: Option<f64>,
    ) -> Result<String> {
        (**self).identify_graph_edge_collection(from, to, known_edge_collections, weight)
    }

    fn derive_edge_key(
        &self,
        index: usize,
        from: &NodeRecord,
        to: &NodeRecord,
        collection: &str,
    ) -> Result<String> {
        (**self).derive_edge_key(index, from, to, collection)
    }

    fn prepare_graph_vertex(&self, vertex: Document, collection: &str) -> Result<Document> {
        (**self).prepare_graph_vertex(vertex, collection)
    }

    fn prepare_graph_edge(&self, edge: Document, collection: &str) -> Result<Document> {
        (**self).prepare_graph_edge(edge, collection)
    }
}
