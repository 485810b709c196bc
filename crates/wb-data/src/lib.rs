//! Data handling for the workbench: ingestion, the embedded table store and
//! the per-session interaction cycle

pub mod config;
pub mod formats;
pub mod ingest;
pub mod remote;
pub mod schema;
pub mod session;
pub mod store;

use arrow::error::ArrowError;
use thiserror::Error;

// Re-exports
pub use config::{IngestConfig, NullConfig};
pub use formats::Format;
pub use ingest::{IngestOutcome, UploadedFile};
pub use remote::{RemoteFetcher, RemotePayload};
pub use session::{Frame, Interaction, Session};
pub use store::{QueryResult, RegisterOutcome, TableStore};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("Spreadsheet error: {0}")]
    Excel(String),

    #[error("SQLite error: {0}")]
    Sqlite(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Schema detection error: {0}")]
    SchemaDetection(String),

    #[error("Dataset '{0}' has no columns")]
    NoColumns(String),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<parquet::errors::ParquetError> for DataError {
    fn from(error: parquet::errors::ParquetError) -> Self {
        DataError::Parquet(error.to_string())
    }
}

impl From<rusqlite::Error> for DataError {
    fn from(error: rusqlite::Error) -> Self {
        DataError::Sqlite(error.to_string())
    }
}

impl From<duckdb::Error> for DataError {
    fn from(error: duckdb::Error) -> Self {
        DataError::Database(error.to_string())
    }
}

/// A statement the engine rejected; `message` is the engine's own diagnostic
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
}

impl From<duckdb::Error> for QueryError {
    fn from(error: duckdb::Error) -> Self {
        Self { message: error.to_string() }
    }
}

impl From<ArrowError> for QueryError {
    fn from(error: ArrowError) -> Self {
        Self { message: error.to_string() }
    }
}

/// Errors turning a payload into registered tables
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("'{name}' could not be read as {format}")]
    UnsupportedFormat {
        name: String,
        format: Format,
        #[source]
        source: DataError,
    },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Errors retrieving a remote payload
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}
