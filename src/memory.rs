//! In-memory [`Database`] implementation
//!
//! Models just enough of the database to drive both converters without a
//! server: document/edge collections with `_id`/`_key` bookkeeping, named
//! graphs, projections, duplicate policies, and failure injection for bulk
//! imports. Single-threaded (interior mutability via `RefCell`).

use crate::database::{
    Database, DocumentStream, ImportOptions, ImportSummary, OnDuplicate, QueryOptions,
};
use crate::document::{self, Document};
use crate::ids;
use crate::schema::{CollectionKind, GraphDefinition};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug)]
struct Collection {
    kind: CollectionKind,
    docs: Vec<Document>,
    by_key: HashMap<String, usize>,
    next_key: u64,
}

impl Collection {
    fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            docs: Vec::new(),
            by_key: HashMap::new(),
            next_key: 1,
        }
    }

    fn truncate(&mut self) {
        self.docs.clear();
        self.by_key.clear();
    }
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, Collection>,
    graphs: BTreeMap<String, GraphDefinition>,
}

/// In-memory database
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    state: RefCell<State>,
    import_calls: Cell<usize>,
    fail_imports_after: Cell<Option<usize>>,
}

impl MemoryDatabase {
    /// Create an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection (if missing) and insert documents into it
    ///
    /// # Errors
    ///
    /// Returns error if a document is rejected (see [`Database::import_bulk`])
    pub fn seed(&self, collection: &str, kind: CollectionKind, docs: Vec<Document>) -> Result<()> {
        if !self.has_collection(collection)? {
            self.create_collection(collection, kind)?;
        }
        let calls = self.import_calls.get();
        self.import_bulk(collection, &docs, &ImportOptions::default())?;
        // Seeding does not count towards failure injection
        self.import_calls.set(calls);
        Ok(())
    }

    /// Make every bulk import after the first `n` fail
    pub fn fail_imports_after(&self, n: usize) {
        self.import_calls.set(0);
        self.fail_imports_after.set(Some(n));
    }

    /// Number of bulk-import calls since the last [`fail_imports_after`](Self::fail_imports_after)
    #[must_use]
    pub fn import_calls(&self) -> usize {
        self.import_calls.get()
    }

    /// Remove a collection and its documents; graph definitions are left as is
    ///
    /// # Errors
    ///
    /// Returns error if the collection does not exist
    pub fn drop_collection(&self, collection: &str) -> Result<()> {
        self.state
            .borrow_mut()
            .collections
            .remove(collection)
            .map(|_| ())
            .ok_or_else(|| anyhow!("collection '{collection}' not found"))
    }

    /// All documents of a collection in insertion order
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.state
            .borrow()
            .collections
            .get(collection)
            .map(|c| c.docs.clone())
            .unwrap_or_default()
    }

    /// Look up one document by key
    #[must_use]
    pub fn get(&self, collection: &str, key: &str) -> Option<Document> {
        let state = self.state.borrow();
        let col = state.collections.get(collection)?;
        col.by_key.get(key).map(|&i| col.docs[i].clone())
    }

    fn prepare(
        collection: &str,
        col: &mut Collection,
        mut doc: Document,
    ) -> Result<(String, Document)> {
        let key = match document::str_field(&doc, document::KEY) {
            Some(key) => key.to_string(),
            None => loop {
                let key = col.next_key.to_string();
                col.next_key += 1;
                if !col.by_key.contains_key(&key) {
                    break key;
                }
            },
        };
        if !ids::is_valid_key(&key) {
            bail!("illegal document key '{key}' in '{collection}'");
        }
        if col.kind == CollectionKind::Edge {
            for field in [document::FROM, document::TO] {
                let endpoint = document::str_field(&doc, field)
                    .with_context(|| format!("edge in '{collection}' lacks {field}"))?;
                ids::decompose(endpoint)
                    .map_err(|e| anyhow!("edge in '{collection}': {e}"))?;
            }
        }
        doc.insert(document::KEY.to_string(), Value::String(key.clone()));
        doc.insert(
            document::ID.to_string(),
            Value::String(ids::compose(collection, &key)),
        );
        Ok((key, doc))
    }
}

impl Database for MemoryDatabase {
    fn has_collection(&self, name: &str) -> Result<bool> {
        Ok(self.state.borrow().collections.contains_key(name))
    }

    fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.collections.contains_key(name) {
            bail!("collection '{name}' already exists");
        }
        state.collections.insert(name.to_string(), Collection::new(kind));
        Ok(())
    }

    fn graph(&self, name: &str) -> Result<Option<GraphDefinition>> {
        Ok(self.state.borrow().graphs.get(name).cloned())
    }

    fn create_graph(&self, definition: &GraphDefinition) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.graphs.contains_key(&definition.name) {
            bail!("graph '{}' already exists", definition.name);
        }
        for edge_col in definition.edge_collections() {
            match state.collections.get(&edge_col) {
                Some(c) if c.kind == CollectionKind::Edge => {}
                Some(_) => bail!("'{edge_col}' is not an edge collection"),
                None => bail!("collection '{edge_col}' not found"),
            }
        }
        for vertex_col in definition.vertex_collections() {
            if !state.collections.contains_key(&vertex_col) {
                bail!("collection '{vertex_col}' not found");
            }
        }
        state
            .graphs
            .insert(definition.name.clone(), definition.clone());
        Ok(())
    }

    fn delete_graph(&self, name: &str) -> Result<()> {
        self.state
            .borrow_mut()
            .graphs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| anyhow!("graph '{name}' not found"))
    }

    fn count(&self, collection: &str) -> Result<usize> {
        self.state
            .borrow()
            .collections
            .get(collection)
            .map(|c| c.docs.len())
            .ok_or_else(|| anyhow!("collection '{collection}' not found"))
    }

    fn fetch<'a>(
        &'a self,
        collection: &str,
        projection: &BTreeSet<String>,
        _options: &QueryOptions,
    ) -> Result<DocumentStream<'a>> {
        let docs = {
            let state = self.state.borrow();
            let col = state
                .collections
                .get(collection)
                .ok_or_else(|| anyhow!("collection '{collection}' not found"))?;
            col.docs.clone()
        };

        if projection.is_empty() {
            return Ok(Box::new(docs.into_iter().map(Ok)));
        }

        let projection = projection.clone();
        Ok(Box::new(docs.into_iter().map(move |doc| {
            Ok(doc
                .into_iter()
                .filter(|(k, _)| {
                    projection.contains(k)
                        || k == document::ID
                        || k == document::FROM
                        || k == document::TO
                })
                .collect())
        })))
    }

    fn import_bulk(
        &self,
        collection: &str,
        documents: &[Document],
        options: &ImportOptions,
    ) -> Result<ImportSummary> {
        let calls = self.import_calls.get() + 1;
        self.import_calls.set(calls);
        if let Some(limit) = self.fail_imports_after.get() {
            if calls > limit {
                bail!("injected import failure on call {calls}");
            }
        }

        let mut state = self.state.borrow_mut();
        let col = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| anyhow!("collection '{collection}' not found"))?;

        if options.overwrite {
            col.truncate();
        }

        let mut summary = ImportSummary::default();
        for doc in documents {
            let (key, doc) = Self::prepare(collection, col, doc.clone())?;
            match col.by_key.get(&key).copied() {
                None => {
                    col.by_key.insert(key, col.docs.len());
                    col.docs.push(doc);
                    summary.created += 1;
                }
                Some(i) => match options.on_duplicate {
                    OnDuplicate::Error => bail!("unique constraint violated: {collection}/{key}"),
                    OnDuplicate::Ignore => summary.ignored += 1,
                    OnDuplicate::Replace => {
                        col.docs[i] = doc;
                        summary.updated += 1;
                    }
                    OnDuplicate::Update => {
                        col.docs[i].extend(doc);
                        summary.updated += 1;
                    }
                },
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EdgeDefinition;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Document::new(),
        }
    }

    #[test]
    fn test_drop_collection() {
        let db = MemoryDatabase::new();
        db.create_collection("c", CollectionKind::Document).unwrap();
        db.drop_collection("c").unwrap();
        assert!(!db.has_collection("c").unwrap());
        assert!(db.drop_collection("c").is_err());
    }

    #[test]
    fn test_seed_assigns_ids() {
        let db = MemoryDatabase::new();
        db.seed(
            "numbers",
            CollectionKind::Document,
            vec![doc(json!({"_key": "1"})), doc(json!({"value": 2}))],
        )
        .unwrap();

        let docs = db.documents("numbers");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["_id"], json!("numbers/1"));
        assert_eq!(docs[1]["_key"], json!("2"));
        assert_eq!(db.count("numbers").unwrap(), 2);
    }

    #[test]
    fn test_duplicate_policies() {
        let db = MemoryDatabase::new();
        db.create_collection("c", CollectionKind::Document).unwrap();
        db.import_bulk("c", &[doc(json!({"_key": "k", "a": 1}))], &ImportOptions::default())
            .unwrap();

        let dup = [doc(json!({"_key": "k", "b": 2}))];
        assert!(db.import_bulk("c", &dup, &ImportOptions::default()).is_err());

        let update = ImportOptions {
            on_duplicate: OnDuplicate::Update,
            ..ImportOptions::default()
        };
        let summary = db.import_bulk("c", &dup, &update).unwrap();
        assert_eq!(summary.updated, 1);
        let merged = db.get("c", "k").unwrap();
        assert_eq!(merged["a"], json!(1));
        assert_eq!(merged["b"], json!(2));

        let replace = ImportOptions {
            on_duplicate: OnDuplicate::Replace,
            ..ImportOptions::default()
        };
        db.import_bulk("c", &[doc(json!({"_key": "k", "c": 3}))], &replace)
            .unwrap();
        let replaced = db.get("c", "k").unwrap();
        assert!(replaced.get("a").is_none());

        let ignore = ImportOptions {
            on_duplicate: OnDuplicate::Ignore,
            ..ImportOptions::default()
        };
        let summary = db.import_bulk("c", &dup, &ignore).unwrap();
        assert_eq!(summary.ignored, 1);
    }

    #[test]
    fn test_edges_require_endpoints() {
        let db = MemoryDatabase::new();
        db.create_collection("e", CollectionKind::Edge).unwrap();
        let bad = [doc(json!({"_from": "a/1"}))];
        assert!(db.import_bulk("e", &bad, &ImportOptions::default()).is_err());

        let good = [doc(json!({"_from": "a/1", "_to": "a/2"}))];
        assert!(db.import_bulk("e", &good, &ImportOptions::default()).is_ok());
    }

    #[test]
    fn test_projection_keeps_identity() {
        let db = MemoryDatabase::new();
        db.seed(
            "e",
            CollectionKind::Edge,
            vec![doc(json!({"_from": "a/1", "_to": "a/2", "w": 1, "junk": true}))],
        )
        .unwrap();

        let projection: BTreeSet<String> = ["w".to_string()].into();
        let docs: Vec<Document> = db
            .fetch("e", &projection, &QueryOptions::default())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let keys: BTreeSet<&str> = docs[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["_from", "_id", "_to", "w"].into());
    }

    #[test]
    fn test_graph_lifecycle() {
        let db = MemoryDatabase::new();
        let def = GraphDefinition {
            name: "g".to_string(),
            edge_definitions: vec![EdgeDefinition::new("e", ["v"], ["v"])],
            orphan_collections: BTreeSet::new(),
        };
        assert!(db.create_graph(&def).is_err(), "collections missing");

        db.create_collection("v", CollectionKind::Document).unwrap();
        db.create_collection("e", CollectionKind::Edge).unwrap();
        db.create_graph(&def).unwrap();
        assert_eq!(db.graph("g").unwrap(), Some(def.clone()));
        assert!(db.create_graph(&def).is_err());

        db.delete_graph("g").unwrap();
        assert!(db.graph("g").unwrap().is_none());
        assert!(db.has_collection("v").unwrap());
    }

    #[test]
    fn test_failure_injection() {
        let db = MemoryDatabase::new();
        db.create_collection("c", CollectionKind::Document).unwrap();
        db.fail_imports_after(1);

        let opts = ImportOptions::default();
        assert!(db.import_bulk("c", &[doc(json!({"_key": "1"}))], &opts).is_ok());
        assert!(db.import_bulk("c", &[doc(json!({"_key": "2"}))], &opts).is_err());
        assert_eq!(db.count("c").unwrap(), 1);
    }
}
