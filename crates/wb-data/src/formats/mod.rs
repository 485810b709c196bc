//! Upload formats and their decoders

mod delimited;
mod excel;
mod columnar;
mod sqlite;

use std::fmt;
use bytes::Bytes;
use wb_core::Dataset;

use crate::config::IngestConfig;
use crate::DataError;

pub use delimited::sniff_delimiter;
pub use excel::excel_serial_to_iso;

/// Leading bytes of every SQLite 3 database file
pub const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";

/// Leading bytes of a Parquet file
pub const PARQUET_MAGIC: &[u8] = b"PAR1";

/// Declared type of an untyped binary payload
pub const OCTET_STREAM: &str = "application/octet-stream";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A decodable upload format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma separated values with a header row
    Csv,
    /// Text with a header row and a sniffed delimiter
    Delimited,
    /// First worksheet of an xlsx workbook
    Excel,
    Parquet,
    /// Every user table of a SQLite database
    Sqlite,
}

/// One table produced by decoding a payload
#[derive(Debug, Clone)]
pub struct DecodedTable {
    pub name: String,
    pub dataset: Dataset,
}

impl Format {
    /// Map a declared MIME type to a format.
    ///
    /// Parameters such as `charset` are ignored. A generic binary stream is
    /// read as Parquet unless it starts with the SQLite header.
    pub fn from_mime(mime: &str, bytes: &[u8]) -> Option<Self> {
        match mime_essence(mime).as_str() {
            OCTET_STREAM if bytes.starts_with(SQLITE_HEADER) => Some(Format::Sqlite),
            OCTET_STREAM => Some(Format::Parquet),
            "application/vnd.apache.parquet" | "application/x-parquet" => Some(Format::Parquet),
            "text/csv" | "application/csv" => Some(Format::Csv),
            "text/plain" | "text/tab-separated-values" => Some(Format::Delimited),
            XLSX_MIME => Some(Format::Excel),
            "application/vnd.sqlite3" | "application/x-sqlite3" => Some(Format::Sqlite),
            _ => None,
        }
    }

    /// Guess a format from a file name extension
    pub fn from_extension(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Format::Csv),
            "tsv" | "tab" | "txt" => Some(Format::Delimited),
            "xlsx" => Some(Format::Excel),
            "parquet" | "pq" => Some(Format::Parquet),
            "sqlite" | "sqlite3" | "db" => Some(Format::Sqlite),
            _ => None,
        }
    }

    /// Guess a format from the payload itself; anything unrecognized is CSV
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(PARQUET_MAGIC) {
            Format::Parquet
        } else if bytes.starts_with(SQLITE_HEADER) {
            Format::Sqlite
        } else {
            Format::Csv
        }
    }

    /// Decode `bytes` into tables. Single-table formats produce one table
    /// called `name`.
    pub fn decode(self, name: &str, bytes: &Bytes, config: &IngestConfig) -> Result<Vec<DecodedTable>, DataError> {
        let single = |dataset: Dataset| -> Result<Vec<DecodedTable>, DataError> {
            if dataset.num_columns() == 0 {
                return Err(DataError::NoColumns(name.to_string()));
            }
            Ok(vec![DecodedTable { name: name.to_string(), dataset }])
        };

        match self {
            Format::Csv => single(delimited::read_delimited(bytes, Some(config.delimiter.unwrap_or(b',')), config)?),
            Format::Delimited => single(delimited::read_delimited(bytes, config.delimiter, config)?),
            Format::Excel => single(excel::read_first_sheet(bytes, config)?),
            Format::Parquet => single(columnar::read_parquet(bytes.clone())?),
            Format::Sqlite => sqlite::read_database(name, bytes),
        }
    }
}

/// The lowercased `type/subtype` of a MIME type, without parameters
pub fn mime_essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Format::Csv => "CSV",
            Format::Delimited => "delimited text",
            Format::Excel => "Excel",
            Format::Parquet => "Parquet",
            Format::Sqlite => "SQLite",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_dispatch() {
        assert_eq!(Format::from_mime("text/csv", b""), Some(Format::Csv));
        assert_eq!(Format::from_mime("text/csv; charset=utf-8", b""), Some(Format::Csv));
        assert_eq!(Format::from_mime("TEXT/PLAIN", b""), Some(Format::Delimited));
        assert_eq!(Format::from_mime("text/tab-separated-values", b""), Some(Format::Delimited));
        assert_eq!(Format::from_mime(XLSX_MIME, b""), Some(Format::Excel));
        assert_eq!(Format::from_mime("application/x-parquet", b""), Some(Format::Parquet));
        assert_eq!(Format::from_mime("application/x-sqlite3", b""), Some(Format::Sqlite));
        assert_eq!(Format::from_mime("image/png", b""), None);
        assert_eq!(Format::from_mime("application/json", b"{}"), None);
    }

    #[test]
    fn test_octet_stream_is_parquet_unless_sqlite() {
        assert_eq!(Format::from_mime("application/octet-stream", b"PAR1...."), Some(Format::Parquet));
        assert_eq!(Format::from_mime("application/octet-stream", b"garbage"), Some(Format::Parquet));

        let mut db = SQLITE_HEADER.to_vec();
        db.extend_from_slice(&[0; 16]);
        assert_eq!(Format::from_mime("application/octet-stream", &db), Some(Format::Sqlite));
    }

    #[test]
    fn test_extension_and_sniffing() {
        assert_eq!(Format::from_extension("sales.CSV"), Some(Format::Csv));
        assert_eq!(Format::from_extension("book.xlsx"), Some(Format::Excel));
        assert_eq!(Format::from_extension("data.parquet"), Some(Format::Parquet));
        assert_eq!(Format::from_extension("README"), None);

        assert_eq!(Format::sniff(b"PAR1\x15\x04"), Format::Parquet);
        assert_eq!(Format::sniff(b"a,b\n1,2\n"), Format::Csv);
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        let result = Format::Csv.decode("empty.csv", &Bytes::new(), &IngestConfig::default());
        assert!(matches!(result, Err(DataError::NoColumns(name)) if name == "empty.csv"));
    }

    #[test]
    fn test_decode_csv() {
        let bytes = Bytes::from_static(b"id,amount\n1,9.5\n2,3\n");
        let tables = Format::Csv.decode("sales.csv", &bytes, &IngestConfig::default()).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "sales.csv");
        assert_eq!(tables[0].dataset.num_rows(), 2);
        assert_eq!(tables[0].dataset.column_names(), vec!["id", "amount"]);
    }
}
