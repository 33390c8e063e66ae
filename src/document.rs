//! JSON documents as exchanged with the database

use serde_json::{Map, Value};

/// A database document (vertex or edge)
pub type Document = Map<String, Value>;

/// Document id attribute (`collection/key`)
pub const ID: &str = "_id";
/// Document key attribute
pub const KEY: &str = "_key";
/// Edge source attribute
pub const FROM: &str = "_from";
/// Edge target attribute
pub const TO: &str = "_to";
/// Default edge weight attribute
pub const DEFAULT_WEIGHT: &str = "weight";

/// String attribute lookup; `None` if absent or not a string
#[must_use]
pub fn str_field<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(Value::as_str)
}

/// Build a document from `(attribute, value)` pairs
pub fn from_pairs<I, K>(pairs: I) -> Document
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
