//! Identifier codec
//!
//! Maps between database document ids (`collection/key`) and opaque graph node
//! ids. The convention is a single separator: ids split on the first `/`, so a
//! key may not contain `/` but the collection part is always the prefix.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between collection name and document key
pub const SEPARATOR: char = '/';

/// Maximum length of a document key in bytes
pub const MAX_KEY_LEN: usize = 254;

/// Punctuation allowed in document keys besides ASCII letters and digits
pub const VALID_KEY_PUNCTUATION: &[char] = &[
    '_', '-', ':', '.', '@', '(', ')', '+', ',', '=', ';', '$', '!', '*', '\'', '%',
];

/// Split `collection/key` into its two parts
///
/// # Errors
///
/// Returns `MalformedIdentifier` if the separator is missing or either part is empty
///
/// # Example
///
/// ```
/// use trueno_arango::ids::decompose;
///
/// assert_eq!(decompose("numbers/42").unwrap(), ("numbers", "42"));
/// assert!(decompose("42").is_err());
/// ```
pub fn decompose(id: &str) -> Result<(&str, &str)> {
    let (collection, key) = id
        .split_once(SEPARATOR)
        .ok_or_else(|| AdapterError::malformed_id(id, "missing '/' separator"))?;

    if collection.is_empty() {
        return Err(AdapterError::malformed_id(id, "empty collection name"));
    }
    if key.is_empty() {
        return Err(AdapterError::malformed_id(id, "empty key"));
    }

    Ok((collection, key))
}

/// Join a collection name and key into a document id
#[must_use]
pub fn compose(collection: &str, key: &str) -> String {
    format!("{collection}{SEPARATOR}{key}")
}

/// Check a document key against the database key alphabet
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || VALID_KEY_PUNCTUATION.contains(&c))
}

/// Opaque graph-library node identifier
///
/// Graphs exported from the database always use `Str` ids (the document
/// `_id`). Graphs built elsewhere may use integer ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphNodeId {
    /// Integer node id
    Int(i64),
    /// String node id
    Str(String),
}

impl GraphNodeId {
    /// String view, if this is a string id
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Decompose as `collection/key`
    ///
    /// # Errors
    ///
    /// Integer ids never decompose
    pub fn decompose(&self) -> Result<(&str, &str)> {
        match self {
            Self::Str(s) => decompose(s),
            Self::Int(i) => Err(AdapterError::malformed_id(
                i.to_string(),
                "integer node ids have no collection",
            )),
        }
    }
}

impl fmt::Display for GraphNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for GraphNodeId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for GraphNodeId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for GraphNodeId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_splits_on_first_separator() {
        assert_eq!(decompose("numbers/1").unwrap(), ("numbers", "1"));
        assert_eq!(decompose("a/b/c").unwrap(), ("a", "b/c"));
    }

    #[test]
    fn test_decompose_rejects_malformed() {
        for bad in ["plain", "/key", "coll/", "", "/"] {
            assert!(
                matches!(decompose(bad), Err(AdapterError::MalformedIdentifier { .. })),
                "{bad} should not decompose"
            );
        }
    }

    #[test]
    fn test_compose_inverts_decompose() {
        let id = compose("Person", "alice");
        assert_eq!(id, "Person/alice");
        assert_eq!(decompose(&id).unwrap(), ("Person", "alice"));
    }

    #[test]
    fn test_key_alphabet() {
        assert!(is_valid_key("student:101"));
        assert!(is_valid_key("a-b_c.d@e(f)+g,h=i;j$k!l*m'n%o"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("has space"));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key(&"k".repeat(MAX_KEY_LEN + 1)));
    }

    #[test]
    fn test_integer_node_ids() {
        let id = GraphNodeId::from(7);
        assert_eq!(id.to_string(), "7");
        assert!(id.as_str().is_none());
        assert!(id.decompose().is_err());

        let id = GraphNodeId::from("numbers/7");
        assert_eq!(id.decompose().unwrap(), ("numbers", "7"));
    }

    #[test]
    fn test_node_id_serde_untagged() {
        let ids: Vec<GraphNodeId> = serde_json::from_str(r#"["a/1", 2]"#).unwrap();
        assert_eq!(ids, vec![GraphNodeId::from("a/1"), GraphNodeId::Int(2)]);
    }
}
