//! xlsx workbooks

use std::io::Cursor;
use std::sync::Arc;
use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use wb_core::Dataset;

use crate::config::{IngestConfig, NullConfig};
use crate::schema::{batch_from_columns, unique_headers};
use crate::DataError;

/// Read the first worksheet; its first row names the columns
pub(crate) fn read_first_sheet(bytes: &[u8], config: &IngestConfig) -> Result<Dataset, DataError> {
    let mut workbook: Xlsx<Cursor<&[u8]>> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| DataError::Excel(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataError::Excel("workbook has no worksheets".to_string()))?
        .map_err(|e| DataError::Excel(e.to_string()))?;

    let rows: Vec<&[Data]> = range.rows().collect();
    sheet_to_dataset(&rows, &config.null_config)
}

static EMPTY_CELL: Data = Data::Empty;

/// Per-column cell kind, widened as cells are seen
#[derive(Debug, Clone, Copy, PartialEq)]
enum CellKind {
    Empty,
    Bool,
    Int,
    Float,
    Text,
}

impl CellKind {
    fn widen(self, other: CellKind) -> CellKind {
        use CellKind::*;
        match (self, other) {
            (a, Empty) => a,
            (Empty, b) => b,
            (a, b) if a == b => a,
            (Int, Float) | (Float, Int) => Float,
            _ => Text,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            CellKind::Bool => DataType::Boolean,
            CellKind::Int => DataType::Int64,
            CellKind::Float => DataType::Float64,
            CellKind::Empty | CellKind::Text => DataType::Utf8,
        }
    }
}

fn cell_kind(cell: &Data, nulls: &NullConfig) -> CellKind {
    match cell {
        Data::Empty | Data::Error(_) => CellKind::Empty,
        Data::Bool(_) => CellKind::Bool,
        Data::Int(_) => CellKind::Int,
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CellKind::Int,
        Data::Float(_) => CellKind::Float,
        Data::String(s) if nulls.is_null(s) => CellKind::Empty,
        _ => CellKind::Text,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_iso(dt.as_f64()),
    }
}

/// Render an Excel date serial (days since 1899-12-30) as an ISO timestamp
pub fn excel_serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let timestamp = epoch.checked_add_signed(Duration::milliseconds(millis))?;
    Some(timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn sheet_to_dataset(rows: &[&[Data]], nulls: &NullConfig) -> Result<Dataset, DataError> {
    let Some((header, body)) = rows.split_first() else {
        return Ok(Dataset::new(batch_from_columns(Arc::new(Schema::empty()), Vec::new(), 0)?));
    };

    let names = unique_headers(header.iter().map(|c| cell_text(c).unwrap_or_default()));
    let mut fields = Vec::with_capacity(names.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(names.len());

    for (idx, name) in names.iter().enumerate() {
        let cells: Vec<&Data> = body.iter().map(|row| row.get(idx).unwrap_or(&EMPTY_CELL)).collect();
        let kind = cells
            .iter()
            .fold(CellKind::Empty, |acc, cell| acc.widen(cell_kind(cell, nulls)));

        let array: ArrayRef = match kind {
            CellKind::Bool => {
                let mut builder = BooleanBuilder::new();
                for cell in &cells {
                    match cell {
                        Data::Bool(b) => builder.append_value(*b),
                        _ => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            CellKind::Int => {
                let mut builder = Int64Builder::new();
                for cell in &cells {
                    match cell {
                        Data::Int(i) => builder.append_value(*i),
                        Data::Float(f) => builder.append_value(*f as i64),
                        _ => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            CellKind::Float => {
                let mut builder = Float64Builder::new();
                for cell in &cells {
                    match cell {
                        Data::Int(i) => builder.append_value(*i as f64),
                        Data::Float(f) => builder.append_value(*f),
                        _ => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            CellKind::Empty | CellKind::Text => {
                let mut builder = StringBuilder::new();
                for cell in &cells {
                    match cell_text(cell).filter(|s| !nulls.is_null(s)) {
                        Some(s) => builder.append_value(s),
                        None => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
        };

        fields.push(Field::new(name, kind.data_type(), true));
        columns.push(array);
    }

    let batch = batch_from_columns(Arc::new(Schema::new(fields)), columns, body.len())?;
    Ok(Dataset::new(batch))
}
