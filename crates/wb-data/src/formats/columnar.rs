//! Parquet files

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use wb_core::Dataset;

use crate::DataError;

/// Read every row group into one dataset
pub(crate) fn read_parquet(bytes: Bytes) -> Result<Dataset, DataError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    Ok(Dataset::new(concat_batches(&schema, &batches)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use arrow::array::{Float64Array, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;
    use parquet::file::properties::WriterProperties;

    fn write_parquet(row_group_size: usize) -> Vec<u8> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("amount", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(schema.clone(), vec![
            Arc::new(Int64Array::from((0..25).collect::<Vec<i64>>())),
            Arc::new(Float64Array::from((0..25).map(|i| i as f64 * 1.5).collect::<Vec<f64>>())),
        ]).unwrap();

        let props = WriterProperties::builder()
            .set_max_row_group_size(row_group_size)
            .build();
        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, Some(props)).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        buf
    }

    #[test]
    fn test_read_all_row_groups() {
        let ds = read_parquet(Bytes::from(write_parquet(10))).unwrap();
        assert_eq!(ds.num_rows(), 25);
        assert_eq!(ds.column_names(), vec!["id", "amount"]);
    }

    #[test]
    fn test_not_parquet() {
        let result = read_parquet(Bytes::from_static(b"id,amount\n1,2\n"));
        assert!(matches!(result, Err(DataError::Parquet(_))));
    }
}
