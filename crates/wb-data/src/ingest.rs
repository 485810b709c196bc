//! Turning uploaded files into registered tables

use std::path::Path;
use bytes::Bytes;
use tracing::{error, warn};

use crate::config::IngestConfig;
use crate::formats::{DecodedTable, Format};
use crate::store::{RegisterOutcome, TableStore};

/// A file handed over by the user
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name, used as the table name
    pub name: String,
    /// Declared MIME type
    pub mime: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, declaring the MIME type its extension implies
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::named(name, bytes))
    }

    /// Contents already in memory, declaring the MIME type the name implies
    pub fn named(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime = mime_guess::from_path(&name).first_or_octet_stream();
        Self::new(name, mime.essence_str(), bytes)
    }
}

/// What happened to one file (or one table of a database file)
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Registered { table: String, rows: usize, columns: usize },
    AlreadyRegistered { table: String },
    /// The declared type is not one the workbench reads
    Skipped { file: String, mime: String },
    Failed { file: String, error: String },
}

/// Decode an upload by its declared type and register the result
pub fn ingest_upload(store: &mut TableStore, file: &UploadedFile, config: &IngestConfig) -> Vec<IngestOutcome> {
    let Some(format) = Format::from_mime(&file.mime, &file.bytes) else {
        warn!("Skipping {}: unsupported type {}", file.name, file.mime);
        return vec![IngestOutcome::Skipped {
            file: file.name.clone(),
            mime: file.mime.clone(),
        }];
    };

    match format.decode(&file.name, &file.bytes, config) {
        Ok(tables) => register_tables(store, &file.name, tables),
        Err(e) => {
            error!("Failed to read {} as {}: {}", file.name, format, e);
            vec![IngestOutcome::Failed {
                file: file.name.clone(),
                error: e.to_string(),
            }]
        }
    }
}

/// Register decoded tables, one outcome per table
pub fn register_tables(store: &mut TableStore, source: &str, tables: Vec<DecodedTable>) -> Vec<IngestOutcome> {
    tables
        .into_iter()
        .map(|table| match store.register(&table.name, &table.dataset) {
            Ok(RegisterOutcome::Created { rows }) => IngestOutcome::Registered {
                columns: table.dataset.num_columns(),
                table: table.name,
                rows,
            },
            Ok(RegisterOutcome::AlreadyExists) => IngestOutcome::AlreadyRegistered { table: table.name },
            Err(e) => {
                error!("Failed to store {} from {}: {}", table.name, source, e);
                IngestOutcome::Failed {
                    file: source.to_string(),
                    error: e.to_string(),
                }
            }
        })
        .collect()
}
