//! Database collaborator interface
//!
//! The converters only need a handful of database operations. Anything that
//! implements [`Database`] (a driver over HTTP, or the in-memory
//! [`MemoryDatabase`](crate::memory::MemoryDatabase)) can be converted from and
//! into. Errors are reported as `anyhow::Error` and wrapped by the converters;
//! retries and timeouts are the implementation's business.

use crate::document::Document;
use crate::schema::{CollectionKind, GraphDefinition};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lazy document stream returned by [`Database::fetch`]
pub type DocumentStream<'a> = Box<dyn Iterator<Item = Result<Document>> + 'a>;

/// Read-query options, passed through to the database untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Cursor batch size
    pub batch_size: Option<usize>,
    /// Cursor time-to-live in seconds
    pub ttl: Option<u64>,
    /// Stream results instead of materialising them server-side
    pub stream: bool,
    /// Any other driver-specific option
    pub extra: Document,
}

/// What bulk import does when a document key already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDuplicate {
    /// Fail the document
    #[default]
    Error,
    /// Merge attributes into the existing document
    Update,
    /// Replace the existing document
    Replace,
    /// Keep the existing document
    Ignore,
}

/// Bulk-import options, passed through to the database untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Duplicate key policy
    pub on_duplicate: OnDuplicate,
    /// Truncate the collection before importing
    pub overwrite: bool,
    /// Any other driver-specific option
    pub extra: Document,
}

/// Outcome of one bulk-import call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Documents created
    pub created: usize,
    /// Existing documents updated or replaced
    pub updated: usize,
    /// Documents skipped by the duplicate policy
    pub ignored: usize,
}

/// Operations the converters consume
pub trait Database {
    /// Whether a collection exists
    ///
    /// # Errors
    ///
    /// Transport errors
    fn has_collection(&self, name: &str) -> Result<bool>;

    /// Create a collection
    ///
    /// # Errors
    ///
    /// Fails if the collection exists or on transport errors
    fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<()>;

    /// Graph metadata, `None` if no such graph
    ///
    /// # Errors
    ///
    /// Transport errors
    fn graph(&self, name: &str) -> Result<Option<GraphDefinition>>;

    /// Create a graph; referenced collections must already exist
    ///
    /// # Errors
    ///
    /// Fails if the graph exists or a collection is missing
    fn create_graph(&self, definition: &GraphDefinition) -> Result<()>;

    /// Drop a graph definition, keeping its collections
    ///
    /// # Errors
    ///
    /// Fails if the graph does not exist
    fn delete_graph(&self, name: &str) -> Result<()>;

    /// Number of documents in a collection
    ///
    /// # Errors
    ///
    /// Fails if the collection does not exist
    fn count(&self, collection: &str) -> Result<usize>;

    /// Stream all documents of a collection
    ///
    /// With a non-empty `projection` only those attributes are returned, plus
    /// `_id` and, for edges, `_from`/`_to`.
    ///
    /// # Errors
    ///
    /// Query errors; stream items carry cursor errors
    fn fetch<'a>(
        &'a self,
        collection: &str,
        projection: &BTreeSet<String>,
        options: &QueryOptions,
    ) -> Result<DocumentStream<'a>>;

    /// Import documents into a collection
    ///
    /// # Errors
    ///
    /// Fails the whole call on the first rejected document
    fn import_bulk(
        &self,
        collection: &str,
        documents: &[Document],
        options: &ImportOptions,
    ) -> Result<ImportSummary>;
}
