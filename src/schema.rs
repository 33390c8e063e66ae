//! Database graph schema: edge definitions, graph definitions, metagraphs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Collection kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Vertex (document) collection
    Document,
    /// Edge collection
    Edge,
}

/// Allowed topology of one edge collection
///
/// Serialises with the database's field names
/// (`edge_collection`, `from_vertex_collections`, `to_vertex_collections`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    /// Edge collection name
    pub edge_collection: String,
    /// Permitted source vertex collections
    pub from_vertex_collections: BTreeSet<String>,
    /// Permitted target vertex collections
    pub to_vertex_collections: BTreeSet<String>,
}

impl EdgeDefinition {
    /// Create an edge definition
    pub fn new<F, T, S>(edge_collection: impl Into<String>, from: F, to: T) -> Self
    where
        F: IntoIterator<Item = S>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            edge_collection: edge_collection.into(),
            from_vertex_collections: from.into_iter().map(Into::into).collect(),
            to_vertex_collections: to.into_iter().map(Into::into).collect(),
        }
    }

    /// Edge definitions for explicit collection sets: every vertex
    /// collection is a valid endpoint for every edge collection
    #[must_use]
    pub fn synthesize(
        vertex_collections: &BTreeSet<String>,
        edge_collections: &BTreeSet<String>,
    ) -> Vec<Self> {
        edge_collections
            .iter()
            .map(|e| Self {
                edge_collection: e.clone(),
                from_vertex_collections: vertex_collections.clone(),
                to_vertex_collections: vertex_collections.clone(),
            })
            .collect()
    }

    /// Whether an edge between these vertex collections is permitted
    #[must_use]
    pub fn permits(&self, from_collection: &str, to_collection: &str) -> bool {
        self.from_vertex_collections.contains(from_collection)
            && self.to_vertex_collections.contains(to_collection)
    }
}

/// Union of all source/target collections of a set of edge definitions
#[must_use]
pub fn vertex_collections(edge_definitions: &[EdgeDefinition]) -> BTreeSet<String> {
    edge_definitions
        .iter()
        .flat_map(|d| d.from_vertex_collections.iter().chain(&d.to_vertex_collections))
        .cloned()
        .collect()
}

/// Edge collection names of a set of edge definitions
#[must_use]
pub fn edge_collections(edge_definitions: &[EdgeDefinition]) -> BTreeSet<String> {
    edge_definitions
        .iter()
        .map(|d| d.edge_collection.clone())
        .collect()
}

/// Order-insensitive comparison of two edge definition lists
#[must_use]
pub fn same_definitions(a: &[EdgeDefinition], b: &[EdgeDefinition]) -> bool {
    let index = |defs: &[EdgeDefinition]| -> BTreeMap<String, EdgeDefinition> {
        defs.iter()
            .map(|d| (d.edge_collection.clone(), d.clone()))
            .collect()
    };
    a.len() == b.len() && index(a) == index(b)
}

/// A named database graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Graph name
    pub name: String,
    /// Edge definitions
    pub edge_definitions: Vec<EdgeDefinition>,
    /// Vertex collections that take part in no edge definition
    #[serde(default)]
    pub orphan_collections: BTreeSet<String>,
}

impl GraphDefinition {
    /// All vertex collections: edge definition endpoints plus orphans
    #[must_use]
    pub fn vertex_collections(&self) -> BTreeSet<String> {
        let mut cols = vertex_collections(&self.edge_definitions);
        cols.extend(self.orphan_collections.iter().cloned());
        cols
    }

    /// All edge collections
    #[must_use]
    pub fn edge_collections(&self) -> BTreeSet<String> {
        edge_collections(&self.edge_definitions)
    }
}

/// Collections to export, each with the attributes to fetch
///
/// Attribute sets are passed to the query as a projection; `_id`, `_from` and
/// `_to` are always kept. An empty set fetches whole documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metagraph {
    /// Vertex collection → attributes
    pub vertex_collections: BTreeMap<String, BTreeSet<String>>,
    /// Edge collection → attributes
    pub edge_collections: BTreeMap<String, BTreeSet<String>>,
}

impl Metagraph {
    /// Metagraph over explicit collection sets, fetching whole documents
    #[must_use]
    pub fn from_collections(
        vertex_collections: &BTreeSet<String>,
        edge_collections: &BTreeSet<String>,
    ) -> Self {
        Self {
            vertex_collections: vertex_collections
                .iter()
                .map(|c| (c.clone(), BTreeSet::new()))
                .collect(),
            edge_collections: edge_collections
                .iter()
                .map(|c| (c.clone(), BTreeSet::new()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_vertex_collections_union() {
        let defs = vec![
            EdgeDefinition::new("accountHolder", ["customer"], ["account"]),
            EdgeDefinition::new("transaction", ["account"], ["account"]),
        ];
        assert_eq!(vertex_collections(&defs), set(&["account", "customer"]));
        assert_eq!(edge_collections(&defs), set(&["accountHolder", "transaction"]));
    }

    #[test]
    fn test_synthesize_all_to_all() {
        let defs = EdgeDefinition::synthesize(&set(&["a", "b"]), &set(&["e1", "e2"]));
        assert_eq!(defs.len(), 2);
        assert!(defs.iter().all(|d| d.permits("a", "b") && d.permits("b", "a")));
    }

    #[test]
    fn test_permits() {
        let def = EdgeDefinition::new("drives", ["Person"], ["Car"]);
        assert!(def.permits("Person", "Car"));
        assert!(!def.permits("Car", "Person"));
    }

    #[test]
    fn test_same_definitions_ignores_order() {
        let a = vec![
            EdgeDefinition::new("likes", ["P"], ["P"]),
            EdgeDefinition::new("dislikes", ["P"], ["P"]),
        ];
        let mut b = a.clone();
        b.reverse();
        assert!(same_definitions(&a, &b));

        b[0].to_vertex_collections.insert("Q".to_string());
        assert!(!same_definitions(&a, &b));
        assert!(!same_definitions(&a, &a[..1]));
    }

    #[test]
    fn test_edge_definition_serde_field_names() {
        let def: EdgeDefinition = serde_json::from_value(serde_json::json!({
            "edge_collection": "to",
            "from_vertex_collections": ["col_a"],
            "to_vertex_collections": ["col_b"],
        }))
        .unwrap();
        assert_eq!(def, EdgeDefinition::new("to", ["col_a"], ["col_b"]));
    }

    #[test]
    fn test_graph_definition_includes_orphans() {
        let graph = GraphDefinition {
            name: "g".to_string(),
            edge_definitions: vec![EdgeDefinition::new("e", ["a"], ["b"])],
            orphan_collections: set(&["lonely"]),
        };
        assert_eq!(graph.vertex_collections(), set(&["a", "b", "lonely"]));
    }

    #[test]
    fn test_metagraph_camel_case() {
        let m: Metagraph = serde_json::from_value(serde_json::json!({
            "vertexCollections": {"Users": ["Age"], "Movies": []},
            "edgeCollections": {"Ratings": ["Rating"]},
        }))
        .unwrap();
        assert_eq!(m.vertex_collections.len(), 2);
        assert_eq!(m.edge_collections["Ratings"], set(&["Rating"]));
    }
}
