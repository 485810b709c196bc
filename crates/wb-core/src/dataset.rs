//! Columnar datasets and table identity

use arrow::array::ArrayRef;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

/// An ordered set of named, typed columns with rows in source order
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
}

/// Identity of a materialized table, used to key per-table view state.
///
/// Two snapshots of the same table name only share cached state while their
/// row count and schema agree.
#[derive(Debug, Clone, PartialEq)]
pub struct TableKey {
    pub name: String,
    pub num_rows: usize,
    pub schema: SchemaRef,
}

impl Dataset {
    /// Wrap a record batch
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// A dataset with the given columns and no rows
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            batch: RecordBatch::new_empty(schema),
        }
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// Identity of this dataset when registered as `name`
    pub fn key(&self, name: &str) -> TableKey {
        TableKey {
            name: name.to_string(),
            num_rows: self.num_rows(),
            schema: self.schema(),
        }
    }
}

impl From<RecordBatch> for Dataset {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    fn sample() -> Dataset {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(schema, vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])),
        ]).unwrap();
        Dataset::new(batch)
    }

    #[test]
    fn test_dataset_shape() {
        let ds = sample();
        assert_eq!(ds.num_rows(), 3);
        assert_eq!(ds.num_columns(), 2);
        assert_eq!(ds.column_names(), vec!["id", "name"]);
        assert!(ds.column("name").is_some());
        assert!(ds.column("missing").is_none());
    }

    #[test]
    fn test_key_tracks_shape() {
        let ds = sample();
        let key = ds.key("people.csv");
        assert_eq!(key, ds.key("people.csv"));
        assert_ne!(key, ds.key("other.csv"));

        let truncated = Dataset::new(ds.batch().slice(0, 2));
        assert_ne!(key, truncated.key("people.csv"));
    }

    #[test]
    fn test_empty_dataset_keeps_schema() {
        let ds = Dataset::empty(sample().schema());
        assert_eq!(ds.num_rows(), 0);
        assert_eq!(ds.num_columns(), 2);
    }
}
