//! SQLite database files

use std::io::Write;
use std::sync::Arc;
use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;
use wb_core::{quote_identifier, Dataset};

use super::DecodedTable;
use crate::schema::batch_from_columns;
use crate::DataError;

/// Read every user table of a database. Tables are named `<file>/<table>`.
pub(crate) fn read_database(file_name: &str, bytes: &[u8]) -> Result<Vec<DecodedTable>, DataError> {
    // rusqlite reads from a path, so the payload is spilled to disk first
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;

    let conn = Connection::open_with_flags(file.path(), OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let tables = list_tables(&conn)?;
    debug!("SQLite file {} holds {} tables", file_name, tables.len());

    tables
        .iter()
        .map(|table| {
            Ok(DecodedTable {
                name: format!("{}/{}", file_name, table),
                dataset: read_table(&conn, table)?,
            })
        })
        .collect()
}

fn list_tables(conn: &Connection) -> Result<Vec<String>, DataError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Declared column names and types
fn table_info(conn: &Connection, table: &str) -> Result<Vec<(String, String)>, DataError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
    let columns = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Arrow type for a column.
///
/// SQLite typing is per value, so the stored values decide; the declared
/// type only matters for columns without values and 0/1 booleans.
fn column_type(declared: &str, values: &[Value]) -> DataType {
    let declared = declared.to_uppercase();
    let mut has_int = false;
    let mut has_real = false;
    let mut has_other = false;

    for value in values {
        match value {
            Value::Null => {}
            Value::Integer(_) => has_int = true,
            Value::Real(_) => has_real = true,
            Value::Text(_) | Value::Blob(_) => has_other = true,
        }
    }

    if has_other {
        DataType::Utf8
    } else if has_real {
        DataType::Float64
    } else if has_int && declared.contains("BOOL") {
        DataType::Boolean
    } else if has_int {
        DataType::Int64
    } else if declared.contains("INT") {
        DataType::Int64
    } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB") {
        DataType::Float64
    } else if declared.contains("BOOL") {
        DataType::Boolean
    } else {
        DataType::Utf8
    }
}

fn read_table(conn: &Connection, table: &str) -> Result<Dataset, DataError> {
    let info = table_info(conn, table)?;
    if info.is_empty() {
        return Err(DataError::NoColumns(table.to_string()));
    }

    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_identifier(table)))?;
    let mut values: Vec<Vec<Value>> = vec![Vec::new(); info.len()];
    let mut rows = stmt.query([])?;
    let mut num_rows = 0;
    while let Some(row) = rows.next()? {
        for (idx, column) in values.iter_mut().enumerate() {
            column.push(row.get::<_, Value>(idx)?);
        }
        num_rows += 1;
    }

    let mut fields = Vec::with_capacity(info.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(info.len());
    for ((name, declared), column) in info.iter().zip(&values) {
        let data_type = column_type(declared, column);
        columns.push(build_array(&data_type, column));
        fields.push(Field::new(name, data_type, true));
    }

    Ok(Dataset::new(batch_from_columns(Arc::new(Schema::new(fields)), columns, num_rows)?))
}

fn build_array(data_type: &DataType, values: &[Value]) -> ArrayRef {
    match data_type {
        DataType::Int64 => {
            let mut builder = Int64Builder::new();
            for value in values {
                match value {
                    Value::Integer(i) => builder.append_value(*i),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::new();
            for value in values {
                match value {
                    Value::Real(f) => builder.append_value(*f),
                    Value::Integer(i) => builder.append_value(*i as f64),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Boolean => {
            let mut builder = BooleanBuilder::new();
            for value in values {
                match value {
                    Value::Integer(i) => builder.append_value(*i != 0),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        _ => {
            let mut builder = StringBuilder::new();
            for value in values {
                match value {
                    Value::Null => builder.append_null(),
                    Value::Integer(i) => builder.append_value(i.to_string()),
                    Value::Real(f) => builder.append_value(f.to_string()),
                    Value::Text(s) => builder.append_value(s),
                    Value::Blob(b) => builder.append_value(String::from_utf8_lossy(b)),
                }
            }
            Arc::new(builder.finish())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, BooleanArray, Float64Array, StringArray};

    fn sample_database() -> Vec<u8> {
        let file = tempfile::NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(file.path()).unwrap();
            conn.execute_batch(
                "CREATE TABLE orders (id INTEGER, total REAL, paid BOOLEAN, note TEXT);
                 INSERT INTO orders VALUES (1, 9.5, 1, 'first'), (2, 3, 0, NULL), (3, NULL, 1, 'third');
                 CREATE TABLE \"empty table\" (a INTEGER, b TEXT);
                 CREATE TABLE mixed (v);
                 INSERT INTO mixed VALUES (1), ('two'), (3.5);",
            ).unwrap();
        }
        std::fs::read(file.path()).unwrap()
    }

    #[test]
    fn test_reads_every_table() {
        let bytes = sample_database();
        assert!(bytes.starts_with(crate::formats::SQLITE_HEADER));

        let tables = read_database("shop.db", &bytes).unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["shop.db/empty table", "shop.db/mixed", "shop.db/orders"]);

        let orders = &tables[2].dataset;
        assert_eq!(orders.num_rows(), 3);
        assert_eq!(orders.column_names(), vec!["id", "total", "paid", "note"]);

        let total = orders.column("total").unwrap().as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(total.value(1), 3.0);
        assert!(total.is_null(2));
        let paid = orders.column("paid").unwrap().as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(!paid.value(1));
    }

    #[test]
    fn test_empty_and_mixed_tables() {
        let tables = read_database("shop.db", &sample_database()).unwrap();

        let empty = &tables[0].dataset;
        assert_eq!(empty.num_rows(), 0);
        assert_eq!(empty.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(empty.schema().field(1).data_type(), &DataType::Utf8);

        let mixed = tables[1].dataset.column("v").unwrap().as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(mixed.value(1), "two");
        assert_eq!(mixed.value(2), "3.5");
    }

    #[test]
    fn test_not_a_database() {
        assert!(read_database("x.db", b"definitely not sqlite").is_err());
    }
}
