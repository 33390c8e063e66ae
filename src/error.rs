//! Error types for conversions in both directions
//!
//! Every variant is raised synchronously to the caller of the top-level
//! conversion. Nothing is retried here: transient database failures belong to
//! the database collaborator and arrive wrapped in [`AdapterError::Database`].

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Conversion errors
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Identifier does not decompose into `collection/key`
    #[error("Malformed identifier '{id}': {reason}")]
    MalformedIdentifier {
        /// Offending identifier
        id: String,
        /// What is wrong with it
        reason: String,
    },

    /// Edge document is missing an endpoint (or carries an unusable weight)
    #[error("Malformed edge in collection '{collection}': {reason}")]
    MalformedEdge {
        /// Edge collection being exported
        collection: String,
        /// What is wrong with the document
        reason: String,
    },

    /// Default edge-collection policy cannot pick between several collections
    #[error(
        "Cannot identify edge collection for {from} -> {to} among {candidates:?}; \
         override Controller::identify_graph_edge_collection"
    )]
    AmbiguousEdgeCollection {
        /// Source node id
        from: String,
        /// Target node id
        to: String,
        /// Declared edge collections
        candidates: Vec<String>,
    },

    /// Node id has no key portion and key derivation was not requested
    #[error("Node '{node}' is not in collection/key form; enable keyify_nodes or override Controller::derive_database_key")]
    KeyDerivationRequired {
        /// Graph node id
        node: String,
    },

    /// Target graph exists with different edge definitions
    #[error("Graph '{graph}' already exists with different edge definitions; set overwrite_graph to replace it")]
    SchemaConflict {
        /// Graph name
        graph: String,
    },

    /// A collection is not known to the database or to the edge definitions
    #[error("Unknown collection '{0}'")]
    UnknownCollection(String),

    /// Named graph does not exist
    #[error("Unknown graph '{0}'")]
    UnknownGraph(String),

    /// Edge endpoints are not permitted by the edge definition
    #[error("Edge {from} -> {to} is not allowed in edge collection '{collection}'")]
    EdgeRejected {
        /// Resolved edge collection
        collection: String,
        /// Source document id
        from: String,
        /// Target document id
        to: String,
    },

    /// Bulk import of one batch failed; earlier batches remain committed
    #[error("Bulk import into '{collection}' failed at batch {batch}")]
    Import {
        /// Target collection
        collection: String,
        /// Zero-based batch index within the collection
        batch: usize,
        /// Database error
        #[source]
        source: anyhow::Error,
    },

    /// Error reported by the database collaborator
    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    /// Error reported by the graph library (construction or enumeration)
    #[error("Graph library error: {0}")]
    Graph(#[source] anyhow::Error),
}

impl AdapterError {
    /// Build a [`AdapterError::MalformedIdentifier`]
    pub fn malformed_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`AdapterError::MalformedEdge`]
    pub fn malformed_edge(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEdge {
            collection: collection.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_override() {
        let err = AdapterError::AmbiguousEdgeCollection {
            from: "Person/1".to_string(),
            to: "Person/2".to_string(),
            candidates: vec!["likes".to_string(), "dislikes".to_string()],
        };
        assert!(err.to_string().contains("identify_graph_edge_collection"));

        let err = AdapterError::KeyDerivationRequired {
            node: "a".to_string(),
        };
        assert!(err.to_string().contains("keyify_nodes"));
    }

    #[test]
    fn test_import_error_keeps_source() {
        use std::error::Error as _;

        let err = AdapterError::Import {
            collection: "numbers".to_string(),
            batch: 2,
            source: anyhow::anyhow!("connection reset"),
        };
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("connection reset".to_string())
        );
    }
}
