//! Edge-list table backed by an Arrow `RecordBatch`
//!
//! # Layout
//!
//! ```text
//! src:    Utf8 | Int64   (not null)
//! dst:    Utf8 | Int64   (not null)
//! <attr>: Float64        (optional weight column, not null)
//! ```
//!
//! Both endpoint columns share one type: string ids (document ids) or integer
//! ids. Mixing them in one table is rejected.

use crate::ids::GraphNodeId;
use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Source column name
pub const SRC: &str = "src";
/// Destination column name
pub const DST: &str = "dst";

/// One decoded row of an [`EdgeList`]
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    /// Source node
    pub src: GraphNodeId,
    /// Destination node
    pub dst: GraphNodeId,
    /// Weight, if the table has a weight column
    pub weight: Option<f64>,
}

/// Columnar edge list
#[derive(Debug, Clone)]
pub struct EdgeList {
    batch: RecordBatch,
    weight_column: Option<String>,
}

impl EdgeList {
    /// Wrap an existing batch, validating its schema
    ///
    /// # Errors
    ///
    /// Returns error if `src`/`dst` are missing or mistyped, or if the weight
    /// column is missing or not `Float64`
    pub fn from_record_batch(batch: RecordBatch, weight_column: Option<&str>) -> Result<Self> {
        let schema = batch.schema();
        let src = schema.field_with_name(SRC).context("edge list lacks src column")?;
        let dst = schema.field_with_name(DST).context("edge list lacks dst column")?;
        if src.data_type() != dst.data_type() {
            bail!(
                "src and dst column types differ ({} vs {})",
                src.data_type(),
                dst.data_type()
            );
        }
        if !matches!(src.data_type(), DataType::Utf8 | DataType::Int64) {
            bail!("unsupported node id column type {}", src.data_type());
        }
        if let Some(name) = weight_column {
            let field = schema
                .field_with_name(name)
                .with_context(|| format!("edge list lacks weight column '{name}'"))?;
            if field.data_type() != &DataType::Float64 {
                bail!("weight column '{name}' must be Float64");
            }
        }

        Ok(Self {
            batch,
            weight_column: weight_column.map(str::to_string),
        })
    }

    /// Number of edges
    #[must_use]
    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the table has no edges
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Name of the weight column, if any
    #[must_use]
    pub fn weight_column(&self) -> Option<&str> {
        self.weight_column.as_deref()
    }

    /// Underlying Arrow batch
    #[must_use]
    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Decode all rows
    ///
    /// # Errors
    ///
    /// Returns error if a column has an unexpected type
    pub fn rows(&self) -> Result<Vec<EdgeRow>> {
        let src = node_column(self.column(SRC)?)?;
        let dst = node_column(self.column(DST)?)?;
        let weights = match &self.weight_column {
            Some(name) => Some(
                self.column(name)?
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .context("Invalid weight column type")?
                    .values()
                    .to_vec(),
            ),
            None => None,
        };

        Ok(src
            .into_iter()
            .zip(dst)
            .enumerate()
            .map(|(i, (src, dst))| EdgeRow {
                src,
                dst,
                weight: weights.as_ref().map(|w| w[i]),
            })
            .collect())
    }

    fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| anyhow!("edge list lacks column '{name}'"))
    }
}

fn node_column(array: &ArrayRef) -> Result<Vec<GraphNodeId>> {
    if let Some(strings) = array.as_any().downcast_ref::<StringArray>() {
        return (0..strings.len())
            .map(|i| {
                if strings.is_null(i) {
                    bail!("null node id at row {i}");
                }
                Ok(GraphNodeId::Str(strings.value(i).to_string()))
            })
            .collect();
    }
    if let Some(ints) = array.as_any().downcast_ref::<Int64Array>() {
        return (0..ints.len())
            .map(|i| {
                if ints.is_null(i) {
                    bail!("null node id at row {i}");
                }
                Ok(GraphNodeId::Int(ints.value(i)))
            })
            .collect();
    }
    bail!("Invalid node id column type {}", array.data_type())
}

/// Row-wise builder for [`EdgeList`]
#[derive(Debug, Clone, Default)]
pub struct EdgeListBuilder {
    src: Vec<GraphNodeId>,
    dst: Vec<GraphNodeId>,
    weights: Vec<f64>,
    weight_column: Option<String>,
}

impl EdgeListBuilder {
    /// Builder for an unweighted table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for a table with a weight column of the given name
    #[must_use]
    pub fn weighted(weight_column: impl Into<String>) -> Self {
        Self {
            weight_column: Some(weight_column.into()),
            ..Self::default()
        }
    }

    /// Reserve room for `additional` rows
    pub fn reserve(&mut self, additional: usize) {
        self.src.reserve(additional);
        self.dst.reserve(additional);
        if self.weight_column.is_some() {
            self.weights.reserve(additional);
        }
    }

    /// Append a row; the weight is ignored by unweighted builders and
    /// defaults to `0` in weighted ones
    pub fn push(&mut self, src: GraphNodeId, dst: GraphNodeId, weight: Option<f64>) {
        self.src.push(src);
        self.dst.push(dst);
        if self.weight_column.is_some() {
            self.weights.push(weight.unwrap_or(0.0));
        }
    }

    /// Rows appended so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.src.len()
    }

    /// Whether no rows were appended
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    /// Build the Arrow table
    ///
    /// # Errors
    ///
    /// Returns error if string and integer node ids are mixed
    pub fn finish(self) -> Result<EdgeList> {
        let all_ints = self
            .src
            .iter()
            .chain(&self.dst)
            .all(|id| matches!(id, GraphNodeId::Int(_)));
        let any_ints = self
            .src
            .iter()
            .chain(&self.dst)
            .any(|id| matches!(id, GraphNodeId::Int(_)));

        let id_type = if !self.src.is_empty() && all_ints {
            DataType::Int64
        } else if any_ints {
            bail!("edge list mixes string and integer node ids");
        } else {
            DataType::Utf8
        };

        let mut fields = vec![
            Field::new(SRC, id_type.clone(), false),
            Field::new(DST, id_type.clone(), false),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            id_array(&self.src, &id_type),
            id_array(&self.dst, &id_type),
        ];
        if let Some(name) = &self.weight_column {
            fields.push(Field::new(name, DataType::Float64, false));
            columns.push(Arc::new(Float64Array::from(self.weights)));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .context("Failed to create edge list RecordBatch")?;

        Ok(EdgeList {
            batch,
            weight_column: self.weight_column,
        })
    }
}

fn id_array(ids: &[GraphNodeId], id_type: &DataType) -> ArrayRef {
    if id_type == &DataType::Int64 {
        Arc::new(Int64Array::from(
            ids.iter()
                .map(|id| match id {
                    GraphNodeId::Int(i) => *i,
                    GraphNodeId::Str(_) => 0,
                })
                .collect::<Vec<_>>(),
        ))
    } else {
        Arc::new(StringArray::from(
            ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_string_table() {
        let mut b = EdgeListBuilder::weighted("weight");
        b.push("numbers/a".into(), "numbers/b".into(), Some(5.0));
        b.push("numbers/a".into(), "numbers/c".into(), None);
        let list = b.finish().unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.weight_column(), Some("weight"));
        let schema = list.record_batch().schema();
        assert_eq!(schema.field_with_name(SRC).unwrap().data_type(), &DataType::Utf8);

        let rows = list.rows().unwrap();
        assert_eq!(rows[0].weight, Some(5.0));
        assert_eq!(rows[1].weight, Some(0.0));
        assert_eq!(rows[1].dst, GraphNodeId::from("numbers/c"));
    }

    #[test]
    fn test_integer_table_unweighted() {
        let mut b = EdgeListBuilder::new();
        b.push(GraphNodeId::Int(1), GraphNodeId::Int(2), Some(9.0));
        let list = b.finish().unwrap();

        let schema = list.record_batch().schema();
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.field_with_name(DST).unwrap().data_type(), &DataType::Int64);

        let rows = list.rows().unwrap();
        assert_eq!(rows[0].weight, None);
        assert_eq!(rows[0].src, GraphNodeId::Int(1));
    }

    #[test]
    fn test_mixed_ids_rejected() {
        let mut b = EdgeListBuilder::new();
        b.push(GraphNodeId::Int(1), GraphNodeId::from("a/1"), None);
        assert!(b.finish().is_err());
    }

    #[test]
    fn test_empty_table() {
        let list = EdgeListBuilder::weighted("w").finish().unwrap();
        assert!(list.is_empty());
        assert!(list.rows().unwrap().is_empty());
    }

    #[test]
    fn test_from_record_batch_validates() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(SRC, DataType::Int64, false),
            Field::new(DST, DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1_i64])),
                Arc::new(StringArray::from(vec!["x"])),
            ],
        )
        .unwrap();
        assert!(EdgeList::from_record_batch(batch, None).is_err());

        let good = EdgeListBuilder::new().finish().unwrap();
        let batch = good.record_batch().clone();
        assert!(EdgeList::from_record_batch(batch.clone(), None).is_ok());
        assert!(EdgeList::from_record_batch(batch, Some("weight")).is_err());
    }
}
