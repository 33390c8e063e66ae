//! trueno-arango: ArangoDB ⇄ GPU graph conversion
//!
//! # Overview
//!
//! trueno-arango maps graph data between a multi-model database (documents
//! identified as `collection/key`, edges with `_from`/`_to`, named graphs with
//! edge definitions) and a GPU-ready CSR graph, in both directions.
//!
//! # Quick Start
//!
//! ```
//! use trueno_arango::{
//!     Adapter, CsrGraph, EdgeDefinition, ImportConfig, LibraryGraph, MemoryDatabase,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = MemoryDatabase::new();
//! let adapter = Adapter::new(&db);
//!
//! // Graph built on the GPU side, node ids without collection prefix
//! let mut graph = CsrGraph::new();
//! graph.add_edge("a".into(), "b".into(), Some(5.0))?;
//! graph.add_edge("a".into(), "c".into(), Some(1.0))?;
//!
//! let definitions = [EdgeDefinition::new("knows", ["numbers"], ["numbers"])];
//! let config = ImportConfig { keyify_nodes: true, ..ImportConfig::default() };
//! let report = adapter.graph_to_arangodb("numbers", &graph, Some(&definitions), &config)?;
//! assert_eq!(report.vertices["numbers"], 3);
//!
//! // And back again
//! let loaded: CsrGraph = adapter.arangodb_graph_to_graph("numbers", &Default::default())?;
//! assert_eq!(loaded.num_edges(), 2);
//! assert_eq!(loaded.node_ids().len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Codec**: [`ids`] splits and joins `collection/key` identifiers
//! - **Policy**: [`Controller`] hooks decide collections and keys
//! - **Collaborators**: [`Database`] (with [`MemoryDatabase`]) and
//!   [`LibraryGraph`] (with [`CsrGraph`])
//! - **Tables**: Arrow-backed [`EdgeList`] between database and graph

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod controller;
pub mod convert;
pub mod database;
pub mod document;
pub mod error;
pub mod ids;
pub mod memory;
pub mod progress;
pub mod schema;
pub mod storage;

// Re-export core types
pub use controller::{Controller, DefaultController, NodeRecord};
pub use convert::{Adapter, ExportOptions, ImportConfig, ImportReport};
pub use database::{Database, ImportOptions, ImportSummary, OnDuplicate, QueryOptions};
pub use document::Document;
pub use error::{AdapterError, Result};
pub use ids::GraphNodeId;
pub use memory::MemoryDatabase;
pub use progress::Verbosity;
pub use schema::{CollectionKind, EdgeDefinition, GraphDefinition, Metagraph};
pub use storage::{CsrGraph, EdgeList, EdgeListBuilder, EdgeRow, GraphType, LibraryGraph};
