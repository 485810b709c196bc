//! Column type inference for text-sourced data

use std::collections::HashSet;
use std::sync::Arc;
use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::config::NullConfig;
use crate::DataError;

/// Schema detector for analyzing text cells and determining column types
pub struct SchemaDetector {
    sample_size: usize,
    null_config: NullConfig,
}

impl SchemaDetector {
    /// Create a new schema detector
    pub fn new(null_config: NullConfig) -> Self {
        Self {
            sample_size: 5000,
            null_config,
        }
    }

    /// Set the sample size for detection
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size.max(1);
        self
    }

    /// Detect a schema from the leading rows of `rows`
    pub fn detect(&self, headers: &[String], rows: &[Vec<String>]) -> Schema {
        let samples = &rows[..rows.len().min(self.sample_size)];
        let fields: Vec<Field> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| Field::new(name, self.detect_column_type(samples, idx), true))
            .collect();
        Schema::new(fields)
    }

    /// Detect column type from sample data.
    ///
    /// Boolean, then Int64, then Float64; a column without any value is Utf8.
    fn detect_column_type(&self, samples: &[Vec<String>], col_idx: usize) -> DataType {
        let mut is_bool = true;
        let mut is_int = true;
        let mut is_float = true;
        let mut seen_value = false;

        for row in samples {
            let Some(value) = row.get(col_idx) else { continue };
            if self.null_config.is_null(value) {
                continue;
            }
            seen_value = true;
            let value = value.trim();

            if is_bool && parse_bool(value).is_none() {
                is_bool = false;
            }
            if is_int && value.parse::<i64>().is_err() {
                is_int = false;
            }
            if is_float && value.parse::<f64>().is_err() {
                is_float = false;
            }
            if !is_bool && !is_int && !is_float {
                break;
            }
        }

        if !seen_value {
            DataType::Utf8
        } else if is_bool {
            DataType::Boolean
        } else if is_int {
            DataType::Int64
        } else if is_float {
            DataType::Float64
        } else {
            DataType::Utf8
        }
    }

    /// Build a record batch from string rows.
    ///
    /// A column whose later rows do not parse as the detected type is kept
    /// as text, so no value is lost.
    pub fn build_batch(&self, schema: Schema, rows: &[Vec<String>]) -> Result<RecordBatch, DataError> {
        let mut fields = Vec::with_capacity(schema.fields().len());
        let mut columns = Vec::with_capacity(schema.fields().len());

        for (col_idx, field) in schema.fields().iter().enumerate() {
            let cells = rows.iter().map(|row| row.get(col_idx).map(String::as_str));
            let typed = match field.data_type() {
                DataType::Boolean => self.boolean_column(cells.clone()),
                DataType::Int64 => self.int_column(cells.clone()),
                DataType::Float64 => self.float_column(cells.clone()),
                _ => None,
            };
            let array = match typed {
                Some(array) => {
                    fields.push(field.as_ref().clone());
                    array
                }
                None => {
                    fields.push(Field::new(field.name(), DataType::Utf8, true));
                    self.string_column(cells)
                }
            };
            columns.push(array);
        }

        batch_from_columns(Arc::new(Schema::new(fields)), columns, rows.len())
    }

    fn null_or<'a>(&self, cell: Option<&'a str>) -> Option<&'a str> {
        cell.filter(|v| !self.null_config.is_null(v)).map(str::trim)
    }

    fn boolean_column<'a>(&self, cells: impl Iterator<Item = Option<&'a str>>) -> Option<ArrayRef> {
        let mut builder = BooleanBuilder::new();
        for cell in cells {
            match self.null_or(cell) {
                Some(v) => builder.append_value(parse_bool(v)?),
                None => builder.append_null(),
            }
        }
        Some(Arc::new(builder.finish()))
    }

    fn int_column<'a>(&self, cells: impl Iterator<Item = Option<&'a str>>) -> Option<ArrayRef> {
        let mut builder = Int64Builder::new();
        for cell in cells {
            match self.null_or(cell) {
                Some(v) => builder.append_value(v.parse().ok()?),
                None => builder.append_null(),
            }
        }
        Some(Arc::new(builder.finish()))
    }

    fn float_column<'a>(&self, cells: impl Iterator<Item = Option<&'a str>>) -> Option<ArrayRef> {
        let mut builder = Float64Builder::new();
        for cell in cells {
            match self.null_or(cell) {
                Some(v) => builder.append_value(v.parse().ok()?),
                None => builder.append_null(),
            }
        }
        Some(Arc::new(builder.finish()))
    }

    fn string_column<'a>(&self, cells: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
        let mut builder = StringBuilder::new();
        for cell in cells {
            match cell.filter(|v| !self.null_config.is_null(v)) {
                Some(v) => builder.append_value(v),
                None => builder.append_null(),
            }
        }
        Arc::new(builder.finish())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Assemble a batch, keeping the row count even when there are no columns
pub(crate) fn batch_from_columns(
    schema: SchemaRef,
    columns: Vec<ArrayRef>,
    num_rows: usize,
) -> Result<RecordBatch, DataError> {
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    Ok(RecordBatch::try_new_with_options(schema, columns, &options)?)
}

/// Make header names usable as column identifiers.
///
/// Blank headers become `column_<n>`; repeated names get a numeric suffix.
pub fn unique_headers<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let base = match raw.as_ref().trim() {
                "" => format!("column_{}", idx + 1),
                name => name.to_string(),
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.to_lowercase()) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int64Array, StringArray};

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detects_types() {
        let detector = SchemaDetector::new(NullConfig::default());
        let data = rows(&[
            &["1", "1.5", "true", "a", ""],
            &["2", "2", "FALSE", "b", "N/A"],
            &["", "3.25", "true", "c", ""],
        ]);
        let schema = detector.detect(&headers(&["i", "f", "b", "s", "empty"]), &data);
        let types: Vec<_> = schema.fields().iter().map(|f| f.data_type().clone()).collect();
        assert_eq!(types, vec![
            DataType::Int64,
            DataType::Float64,
            DataType::Boolean,
            DataType::Utf8,
            DataType::Utf8,
        ]);
    }

    #[test]
    fn test_build_batch_with_nulls() {
        let detector = SchemaDetector::new(NullConfig::default());
        let data = rows(&[&["1", "x"], &["null", "y"], &["3", "-"]]);
        let schema = detector.detect(&headers(&["id", "name"]), &data);
        let batch = detector.build_batch(schema, &data).unwrap();

        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.value(0), 1);
        assert!(ids.is_null(1));
        let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert!(names.is_null(2));
    }

    #[test]
    fn test_values_past_sample_fall_back_to_text() {
        let detector = SchemaDetector::new(NullConfig::default()).with_sample_size(2);
        let data = rows(&[&["1"], &["2"], &["three"]]);
        let schema = detector.detect(&headers(&["n"]), &data);
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);

        let batch = detector.build_batch(schema, &data).unwrap();
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        let values = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(values.value(2), "three");
    }

    #[test]
    fn test_int_and_float_mix_is_float() {
        let detector = SchemaDetector::new(NullConfig::default());
        let data = rows(&[&["1"], &["2.5"]]);
        let schema = detector.detect(&headers(&["x"]), &data);
        let batch = detector.build_batch(schema, &data).unwrap();
        let values = batch.column(0).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(values.value(0), 1.0);
    }

    #[test]
    fn test_unique_headers() {
        assert_eq!(
            unique_headers(["id", "", "id", "ID", "name"]),
            vec!["id", "column_2", "id_1", "ID_2", "name"]
        );
    }
}
