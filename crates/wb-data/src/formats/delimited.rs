//! CSV and other delimited text

use std::sync::Arc;
use arrow::datatypes::Schema;
use csv::ReaderBuilder;
use tracing::debug;
use wb_core::Dataset;

use crate::config::IngestConfig;
use crate::schema::{batch_from_columns, unique_headers, SchemaDetector};
use crate::DataError;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Pick the delimiter that occurs most often in the header line
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes
        .split(|&b| b == b'\n')
        .find(|line| !line.iter().all(u8::is_ascii_whitespace))
        .unwrap_or_default();

    CANDIDATE_DELIMITERS
        .iter()
        .map(|&d| (d, header.iter().filter(|&&b| b == d).count()))
        .filter(|&(_, count)| count > 0)
        .fold(None, |best: Option<(u8, usize)>, (d, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((d, count)),
        })
        .map_or(b',', |(d, _)| d)
}

/// Read a delimited payload with a header row.
///
/// `delimiter` of `None` sniffs one from the header line. Short rows are
/// padded with nulls and extra cells are ignored.
pub(crate) fn read_delimited(bytes: &[u8], delimiter: Option<u8>, config: &IngestConfig) -> Result<Dataset, DataError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(bytes));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = unique_headers(reader.headers()?.iter());
    if headers.is_empty() {
        return Ok(Dataset::new(batch_from_columns(Arc::new(Schema::empty()), Vec::new(), 0)?));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    debug!("Read {} delimited rows with delimiter {:?}", rows.len(), delimiter as char);

    let detector = SchemaDetector::new(config.null_config.clone()).with_sample_size(config.sample_rows);
    let schema = detector.detect(&headers, &rows);
    Ok(Dataset::new(detector.build_batch(schema, &rows)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, BooleanArray, Int64Array};
    use arrow::datatypes::DataType;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"a,b,c\n1,2,3"), b',');
        assert_eq!(sniff_delimiter(b"a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter(b"\n\na\tb\tc\n"), b'\t');
        assert_eq!(sniff_delimiter(b"a|b\n"), b'|');
        assert_eq!(sniff_delimiter(b"single\n1\n"), b',');
        assert_eq!(sniff_delimiter(b""), b',');
    }

    #[test]
    fn test_read_tab_separated() {
        let data = b"id\tactive\tname\n1\ttrue\tann\n2\tfalse\tbob\n3\t\tcy\n";
        let ds = read_delimited(data, None, &IngestConfig::default()).unwrap();
        assert_eq!(ds.num_rows(), 3);
        assert_eq!(ds.column_names(), vec!["id", "active", "name"]);

        let schema = ds.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Boolean);
        let active = ds.column("active").unwrap().as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(active.value(0));
        assert!(active.is_null(2));
    }

    #[test]
    fn test_ragged_rows_and_bom() {
        let data = b"\xEF\xBB\xBFid,score\n1,10\n2\n3,30,extra\n";
        let ds = read_delimited(data, Some(b','), &IngestConfig::default()).unwrap();
        assert_eq!(ds.column_names(), vec!["id", "score"]);
        assert_eq!(ds.num_rows(), 3);
        let score = ds.column("score").unwrap().as_any().downcast_ref::<Int64Array>().unwrap();
        assert!(score.is_null(1));
        assert_eq!(score.value(2), 30);
    }

    #[test]
    fn test_header_only() {
        let ds = read_delimited(b"a,b\n", None, &IngestConfig::default()).unwrap();
        assert_eq!(ds.num_rows(), 0);
        assert_eq!(ds.num_columns(), 2);
    }

    #[test]
    fn test_quoted_fields() {
        let data = b"name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n";
        let ds = read_delimited(data, Some(b','), &IngestConfig::default()).unwrap();
        assert_eq!(ds.num_rows(), 1);
        assert_eq!(ds.num_columns(), 2);
    }
}
