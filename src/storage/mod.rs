//! Graph-library side of the conversion
//!
//! Provides the arrow-backed edge-list table, the CSR graph representation, and
//! the [`LibraryGraph`] seam the converters are generic over.

pub mod csr;
pub mod edge_list;

pub use csr::{CsrGraph, GraphType, NodeIndex};
pub use edge_list::{EdgeList, EdgeListBuilder, EdgeRow};

use crate::ids::GraphNodeId;
use anyhow::Result;

/// Graph-library graph the converters build and read
///
/// Only node identity and a single numeric edge weight cross this boundary.
pub trait LibraryGraph: Sized {
    /// Construct a graph from a node set and an edge-list table
    ///
    /// Endpoints missing from `nodes` are added implicitly.
    ///
    /// # Errors
    ///
    /// Returns error if the table is inconsistent
    fn from_edge_list(nodes: &[GraphNodeId], edges: &EdgeList, graph_type: GraphType)
        -> Result<Self>;

    /// All node ids
    fn node_ids(&self) -> Vec<GraphNodeId>;

    /// All edges, with a weight column if the graph is weighted
    ///
    /// # Errors
    ///
    /// Returns error if the table cannot be materialised
    fn edge_list(&self) -> Result<EdgeList>;
}
