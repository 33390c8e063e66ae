//! CSR (Compressed Sparse Row) graph representation
//!
//! Based on `GraphBLAST` (Yang et al., ACM `ToMS` 2022) for GPU-optimized sparse matrix operations.
//!
//! # CSR Format
//!
//! ```text
//! Graph: a → b, a → c, b → c   (node ids mapped to dense indices a=0, b=1, c=2)
//!
//! CSR:
//!   row_offsets: [0, 2, 3, 3]  // Node 0: edges [0..2), Node 1: [2..3), Node 2: [3..3)
//!   col_indices: [1, 2, 2]      // Edge 0 → node 1, edge 1 → node 2, edge 2 → node 2
//!   edge_weights: [1.0, 1.0, 1.0]
//! ```
//!
//! Opaque node ids (document ids or integers) are mapped to dense `u32`
//! indices in first-seen order: the node set first, then edge endpoints.

use super::edge_list::{EdgeList, EdgeListBuilder};
use super::LibraryGraph;
use crate::document::DEFAULT_WEIGHT;
use crate::ids::GraphNodeId;
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Dense node index (zero-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

/// Graph construction options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphType {
    /// Directed edges; undirected graphs treat (a, b) and (b, a) as the same pair
    pub directed: bool,
    /// Keep parallel edges; otherwise the first occurrence of a pair wins
    pub multigraph: bool,
}

impl Default for GraphType {
    fn default() -> Self {
        Self {
            directed: true,
            multigraph: true,
        }
    }
}

/// CSR (Compressed Sparse Row) graph
///
/// Optimized for:
/// - O(1) access to outgoing edges (via forward CSR)
/// - O(1) access to incoming edges (via reverse CSR)
/// - GPU-friendly memory layout
///
/// # Example
///
/// ```
/// use trueno_arango::{CsrGraph, GraphNodeId};
///
/// let mut graph = CsrGraph::new();
/// graph.add_edge("numbers/a".into(), "numbers/b".into(), Some(5.0)).unwrap();
/// graph.add_edge("numbers/a".into(), "numbers/c".into(), Some(1.0)).unwrap();
///
/// let a = graph.index_of(&GraphNodeId::from("numbers/a")).unwrap();
/// assert_eq!(graph.outgoing_neighbors(a).unwrap().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CsrGraph {
    graph_type: GraphType,

    /// Forward CSR: Row offsets for outgoing edges
    /// node i's edges start at `row_offsets`[i]
    /// Length: `num_nodes` + 1
    row_offsets: Vec<u32>,

    /// Forward CSR: Column indices (edge targets)
    /// Length: `num_edges`
    col_indices: Vec<u32>,

    /// Forward CSR: Edge weights
    /// Length: `num_edges`
    edge_weights: Vec<f64>,

    /// Reverse CSR: Row offsets for incoming edges
    rev_row_offsets: Vec<u32>,

    /// Reverse CSR: Column indices (edge sources)
    rev_col_indices: Vec<u32>,

    /// Opaque id of each dense index
    node_ids: Vec<GraphNodeId>,

    index: HashMap<GraphNodeId, NodeIndex>,

    /// Name of the weight column, `None` for unweighted graphs
    weight_column: Option<String>,
}

impl CsrGraph {
    /// Create new empty directed multigraph
    #[must_use]
    pub fn new() -> Self {
        Self::with_type(GraphType::default())
    }

    /// Create new empty graph with the given construction options
    #[must_use]
    pub fn with_type(graph_type: GraphType) -> Self {
        Self {
            graph_type,
            row_offsets: vec![0], // Start with single offset
            col_indices: Vec::new(),
            edge_weights: Vec::new(),
            rev_row_offsets: vec![0],
            rev_col_indices: Vec::new(),
            node_ids: Vec::new(),
            index: HashMap::new(),
            weight_column: None,
        }
    }

    /// Add a node without edges; returns its index (existing nodes keep theirs)
    ///
    /// # Errors
    ///
    /// Returns error if the graph already holds `u32::MAX` nodes
    pub fn add_node(&mut self, id: GraphNodeId) -> Result<NodeIndex> {
        if let Some(&idx) = self.index.get(&id) {
            return Ok(idx);
        }
        let idx = NodeIndex(
            u32::try_from(self.node_ids.len()).map_err(|_| anyhow!("graph node limit reached"))?,
        );
        self.index.insert(id.clone(), idx);
        self.node_ids.push(id);

        // New node has no edges
        let last = *self.row_offsets.last().unwrap_or(&0);
        self.row_offsets.push(last);
        let rev_last = *self.rev_row_offsets.last().unwrap_or(&0);
        self.rev_row_offsets.push(rev_last);

        Ok(idx)
    }

    /// Add edge to graph (dynamic insertion)
    ///
    /// Note: For large graphs, use [`LibraryGraph::from_edge_list`] for better performance.
    /// A weight makes the graph weighted; edges added without one weigh `0`.
    /// Returns `false` if the edge was dropped as a parallel edge of a
    /// non-multigraph.
    ///
    /// # Errors
    ///
    /// Returns error if the node limit is reached
    pub fn add_edge(
        &mut self,
        src: GraphNodeId,
        dst: GraphNodeId,
        weight: Option<f64>,
    ) -> Result<bool> {
        let s = self.add_node(src)?;
        let d = self.add_node(dst)?;

        if !self.graph_type.multigraph && self.has_edge(s, d) {
            return Ok(false);
        }
        if weight.is_some() && self.weight_column.is_none() {
            self.weight_column = Some(DEFAULT_WEIGHT.to_string());
        }

        // Insert forward edge (src → dst)
        let src_idx = s.0 as usize;
        let end = self.row_offsets[src_idx + 1] as usize;
        self.col_indices.insert(end, d.0);
        self.edge_weights.insert(end, weight.unwrap_or(0.0));
        for offset in &mut self.row_offsets[src_idx + 1..] {
            *offset += 1;
        }

        // Insert reverse edge (dst ← src)
        let dst_idx = d.0 as usize;
        let rev_end = self.rev_row_offsets[dst_idx + 1] as usize;
        self.rev_col_indices.insert(rev_end, s.0);
        for offset in &mut self.rev_row_offsets[dst_idx + 1..] {
            *offset += 1;
        }

        Ok(true)
    }

    fn has_edge(&self, s: NodeIndex, d: NodeIndex) -> bool {
        let forward = |a: NodeIndex, b: NodeIndex| {
            let start = self.row_offsets[a.0 as usize] as usize;
            let end = self.row_offsets[a.0 as usize + 1] as usize;
            self.col_indices[start..end].contains(&b.0)
        };
        forward(s, d) || (!self.graph_type.directed && forward(d, s))
    }

    /// Get outgoing neighbors of a node
    ///
    /// # Errors
    ///
    /// Returns error if node index is out of bounds
    pub fn outgoing_neighbors(&self, node: NodeIndex) -> Result<&[u32]> {
        if (node.0 as usize) >= self.num_nodes() {
            bail!("Node index {} out of bounds", node.0);
        }

        let idx = node.0 as usize;
        let start = self.row_offsets[idx] as usize;
        let end = self.row_offsets[idx + 1] as usize;

        Ok(&self.col_indices[start..end])
    }

    /// Get incoming neighbors of a node
    ///
    /// Returns O(1) access to incoming edges via reverse CSR.
    ///
    /// # Errors
    ///
    /// Returns error if node index is out of bounds
    pub fn incoming_neighbors(&self, target: NodeIndex) -> Result<&[u32]> {
        if (target.0 as usize) >= self.num_nodes() {
            bail!("Node index {} out of bounds", target.0);
        }

        let idx = target.0 as usize;
        let start = self.rev_row_offsets[idx] as usize;
        let end = self.rev_row_offsets[idx + 1] as usize;

        Ok(&self.rev_col_indices[start..end])
    }

    /// Dense index of a node id
    #[must_use]
    pub fn index_of(&self, id: &GraphNodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Node id at a dense index
    #[must_use]
    pub fn node_id(&self, node: NodeIndex) -> Option<&GraphNodeId> {
        self.node_ids.get(node.0 as usize)
    }

    /// Get number of nodes
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.node_ids.len()
    }

    /// Get number of edges
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.col_indices.len()
    }

    /// Construction options
    #[must_use]
    pub const fn graph_type(&self) -> GraphType {
        self.graph_type
    }

    /// Whether edges carry weights
    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.weight_column.is_some()
    }

    /// Iterate over edges as (source index, target index, weight), grouped by source
    pub fn iter_edges(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        self.row_offsets.windows(2).enumerate().flat_map(move |(src, w)| {
            let (start, end) = (w[0] as usize, w[1] as usize);
            #[allow(clippy::cast_possible_truncation)] // node count is bounded by u32 in add_node
            let src = src as u32;
            self.col_indices[start..end]
                .iter()
                .zip(&self.edge_weights[start..end])
                .map(move |(&dst, &weight)| (src, dst, weight))
        })
    }

    /// Get CSR components
    #[must_use]
    pub fn csr_components(&self) -> (&[u32], &[u32], &[f64]) {
        (&self.row_offsets, &self.col_indices, &self.edge_weights)
    }
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryGraph for CsrGraph {
    fn from_edge_list(
        nodes: &[GraphNodeId],
        edges: &EdgeList,
        graph_type: GraphType,
    ) -> Result<Self> {
        let rows = edges.rows()?;

        let mut node_ids: Vec<GraphNodeId> = Vec::with_capacity(nodes.len());
        let mut index: HashMap<GraphNodeId, NodeIndex> = HashMap::with_capacity(nodes.len());
        let mut intern = |id: &GraphNodeId| -> Result<u32> {
            if let Some(idx) = index.get(id) {
                return Ok(idx.0);
            }
            let idx = u32::try_from(node_ids.len()).map_err(|_| anyhow!("graph node limit reached"))?;
            index.insert(id.clone(), NodeIndex(idx));
            node_ids.push(id.clone());
            Ok(idx)
        };

        for id in nodes {
            intern(id)?;
        }

        let mut triples = Vec::with_capacity(rows.len());
        let mut seen = HashSet::new();
        for row in &rows {
            let s = intern(&row.src)?;
            let d = intern(&row.dst)?;
            if !graph_type.multigraph {
                let pair = if graph_type.directed { (s, d) } else { (s.min(d), s.max(d)) };
                if !seen.insert(pair) {
                    continue;
                }
            }
            triples.push((s, d, row.weight.unwrap_or(0.0)));
        }

        let num_nodes = node_ids.len();

        // Build adjacency lists (temporary) for both forward and reverse
        let mut adj_list: Vec<Vec<(u32, f64)>> = vec![Vec::new(); num_nodes];
        let mut rev_adj_list: Vec<Vec<u32>> = vec![Vec::new(); num_nodes];
        for &(src, dst, weight) in &triples {
            adj_list[src as usize].push((dst, weight));
            rev_adj_list[dst as usize].push(src); // Reverse: dst ← src
        }

        // Build forward CSR
        let mut row_offsets = Vec::with_capacity(num_nodes + 1);
        let mut col_indices = Vec::with_capacity(triples.len());
        let mut edge_weights = Vec::with_capacity(triples.len());
        let mut offset = 0_u32;
        row_offsets.push(offset);
        for neighbors in &adj_list {
            #[allow(clippy::cast_possible_truncation)] // edge count per node fits u32
            let len_u32 = neighbors.len() as u32;
            offset += len_u32;
            row_offsets.push(offset);
            for (target, weight) in neighbors {
                col_indices.push(*target);
                edge_weights.push(*weight);
            }
        }

        // Build reverse CSR
        let mut rev_row_offsets = Vec::with_capacity(num_nodes + 1);
        let mut rev_col_indices = Vec::with_capacity(triples.len());
        let mut rev_offset = 0_u32;
        rev_row_offsets.push(rev_offset);
        for sources in &rev_adj_list {
            #[allow(clippy::cast_possible_truncation)]
            let len_u32 = sources.len() as u32;
            rev_offset += len_u32;
            rev_row_offsets.push(rev_offset);
            rev_col_indices.extend_from_slice(sources);
        }

        Ok(Self {
            graph_type,
            row_offsets,
            col_indices,
            edge_weights,
            rev_row_offsets,
            rev_col_indices,
            node_ids,
            index,
            weight_column: edges.weight_column().map(str::to_string),
        })
    }

    fn node_ids(&self) -> Vec<GraphNodeId> {
        self.node_ids.clone()
    }

    fn edge_list(&self) -> Result<EdgeList> {
        let mut builder = match &self.weight_column {
            Some(name) => EdgeListBuilder::weighted(name.clone()),
            None => EdgeListBuilder::new(),
        };
        builder.reserve(self.num_edges());
        for (src, dst, weight) in self.iter_edges() {
            builder.push(
                self.node_ids[src as usize].clone(),
                self.node_ids[dst as usize].clone(),
                Some(weight),
            );
        }
        builder.finish()
    }
}
