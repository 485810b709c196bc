//! Session-scoped table store on an embedded DuckDB connection

use std::sync::Arc;
use std::time::{Duration, Instant};
use arrow::array::{Array, ArrayRef, StringBuilder};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use duckdb::Connection;
use indexmap::IndexSet;
use tracing::{debug, info, warn};
use wb_core::{quote_identifier, Dataset, StoreSettings};

use crate::{DataError, QueryError};

/// Result of registering a dataset under a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created { rows: usize },
    /// A table with this name already exists; nothing was written
    AlreadyExists,
}

/// Materialized result of one statement
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub dataset: Dataset,
    pub elapsed: Duration,
}

impl QueryResult {
    pub fn num_rows(&self) -> usize {
        self.dataset.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.dataset.num_columns()
    }
}

/// Named tables in an in-memory analytical database
pub struct TableStore {
    conn: Connection,
    /// Names registered through this store, in registration order
    registered: IndexSet<String>,
}

impl TableStore {
    /// Open an in-memory database
    pub fn open(settings: &StoreSettings) -> Result<Self, DataError> {
        let conn = Connection::open_in_memory()?;

        if settings.load_spatial {
            match conn.execute_batch("INSTALL spatial; LOAD spatial;") {
                Ok(()) => debug!("Spatial extension loaded"),
                Err(e) => warn!("Spatial extension unavailable: {}", e),
            }
        }

        Ok(Self {
            conn,
            registered: IndexSet::new(),
        })
    }

    /// Store `dataset` as table `name` unless that name is taken
    pub fn register(&mut self, name: &str, dataset: &Dataset) -> Result<RegisterOutcome, DataError> {
        if dataset.num_columns() == 0 {
            return Err(DataError::NoColumns(name.to_string()));
        }
        if self.table_exists(name)? {
            debug!("Table {} already registered, keeping stored rows", name);
            return Ok(RegisterOutcome::AlreadyExists);
        }

        let batch = normalize_batch(dataset.batch())?;
        let columns = batch
            .schema()
            .fields()
            .iter()
            .map(|f| format!("{} {}", quote_identifier(f.name()), sql_type(f.data_type())))
            .collect::<Vec<_>>()
            .join(", ");
        let ddl = format!("CREATE TABLE {} ({});", quote_identifier(name), columns);
        create_and_fill(&mut self.conn, &ddl, name, &batch)?;

        self.registered.insert(name.to_string());
        info!("Registered table {} ({} rows, {} columns)", name, batch.num_rows(), batch.num_columns());
        Ok(RegisterOutcome::Created { rows: batch.num_rows() })
    }

    /// Whether a table of this name exists; names compare case-insensitively
    pub fn table_exists(&self, name: &str) -> Result<bool, DataError> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_schema = 'main' AND lower(table_name) = lower(?)",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Every base table, registered ones first in registration order
    pub fn list_tables(&self) -> Result<Vec<String>, DataError> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' AND table_type = 'BASE TABLE' ORDER BY table_name",
        )?;
        let present = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<IndexSet<_>, _>>()?;

        let mut tables: Vec<String> = self
            .registered
            .iter()
            .filter(|name| present.contains(*name))
            .cloned()
            .collect();
        tables.extend(present.into_iter().filter(|name| !self.registered.contains(name)));
        Ok(tables)
    }

    /// Run one statement and materialize its result
    pub fn execute(&self, sql: &str) -> Result<QueryResult, QueryError> {
        let started = Instant::now();
        let mut stmt = self.conn.prepare(sql)?;
        let arrow = stmt.query_arrow([])?;
        let schema: SchemaRef = arrow.get_schema();
        let batches: Vec<RecordBatch> = arrow.collect();

        let batch = if batches.is_empty() {
            RecordBatch::new_empty(schema)
        } else {
            concat_batches(&schema, &batches)?
        };
        debug!("Query returned {} rows in {:?}", batch.num_rows(), started.elapsed());

        Ok(QueryResult {
            dataset: Dataset::new(batch),
            elapsed: started.elapsed(),
        })
    }

    /// Every row of a table
    pub fn fetch_all(&self, name: &str) -> Result<Dataset, QueryError> {
        self.execute(&format!("SELECT * FROM {}", quote_identifier(name)))
            .map(|result| result.dataset)
    }

    pub fn row_count(&self, name: &str) -> Result<usize, QueryError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT count(*) FROM {}", quote_identifier(name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }
}

impl std::fmt::Debug for TableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStore")
            .field("registered", &self.registered)
            .finish()
    }
}

/// Create the table and append its rows in one transaction, so a failed
/// append leaves no empty table behind
fn create_and_fill(conn: &mut Connection, ddl: &str, name: &str, batch: &RecordBatch) -> Result<(), DataError> {
    let tx = conn.transaction()?;
    tx.execute_batch(ddl)?;
    if batch.num_rows() > 0 {
        let mut appender = tx.appender(name)?;
        appender.append_record_batch(batch.clone())?;
        appender.flush()?;
    }
    tx.commit()?;
    Ok(())
}

/// Storage type of a normalized column
fn sql_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Int64 => "BIGINT",
        DataType::Float64 => "DOUBLE",
        DataType::Boolean => "BOOLEAN",
        DataType::Date32 => "DATE",
        DataType::Timestamp(_, _) => "TIMESTAMP",
        _ => "VARCHAR",
    }
}

/// Reduce every column to BIGINT, DOUBLE, BOOLEAN, DATE, TIMESTAMP or
/// VARCHAR storage. Decimals become DOUBLE; time zones are dropped.
fn normalize_batch(batch: &RecordBatch) -> Result<RecordBatch, DataError> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let target = match field.data_type() {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
            | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => DataType::Int64,
            DataType::Float16 | DataType::Float32 | DataType::Float64
            | DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => DataType::Float64,
            DataType::Boolean => DataType::Boolean,
            DataType::Date32 | DataType::Date64 => DataType::Date32,
            DataType::Timestamp(_, _) => DataType::Timestamp(TimeUnit::Microsecond, None),
            _ => DataType::Utf8,
        };

        let array = match (field.data_type(), &target) {
            (DataType::Utf8, _) => column.clone(),
            (DataType::LargeUtf8, _) => cast(column, &DataType::Utf8)?,
            (_, DataType::Utf8) => render_as_text(column)?,
            _ => cast(column, &target)?,
        };
        fields.push(Field::new(field.name(), target, true));
        columns.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    crate::schema::batch_from_columns(schema, columns, batch.num_rows())
}

fn render_as_text(column: &ArrayRef) -> Result<ArrayRef, DataError> {
    let mut builder = StringBuilder::new();
    for row in 0..column.len() {
        if column.is_null(row) {
            builder.append_null();
        } else {
            builder.append_value(array_value_to_string(column, row)?);
        }
    }
    Ok(Arc::new(builder.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float32Array, Float64Array, Int64Array,
        StringArray, TimestampMillisecondArray, UInt8Array,
    };

    fn store() -> TableStore {
        TableStore::open(&StoreSettings { load_spatial: false }).unwrap()
    }

    fn sales(rows: i64) -> Dataset {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("amount", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(schema, vec![
            Arc::new(Int64Array::from((1..=rows).collect::<Vec<_>>())),
            Arc::new(Float64Array::from((1..=rows).map(|i| i as f64 / 2.0).collect::<Vec<_>>())),
        ]).unwrap();
        Dataset::new(batch)
    }

    #[test]
    fn test_register_and_count() {
        let mut store = store();
        let outcome = store.register("sales.csv", &sales(100)).unwrap();
        assert_eq!(outcome, RegisterOutcome::Created { rows: 100 });
        assert_eq!(store.row_count("sales.csv").unwrap(), 100);

        let result = store.execute("select count(*) from \"sales.csv\"").unwrap();
        assert_eq!(result.num_rows(), 1);
        let count = result.dataset.batch().column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(count.value(0), 100);
    }

    #[test]
    fn test_reregister_is_noop() {
        let mut store = store();
        store.register("sales.csv", &sales(100)).unwrap();
        let outcome = store.register("sales.csv", &sales(5)).unwrap();
        assert_eq!(outcome, RegisterOutcome::AlreadyExists);
        assert_eq!(store.row_count("sales.csv").unwrap(), 100);
        assert_eq!(store.list_tables().unwrap(), vec!["sales.csv".to_string()]);
    }

    #[test]
    fn test_list_tables_in_registration_order() {
        let mut store = store();
        store.register("zeta.csv", &sales(1)).unwrap();
        store.register("alpha.csv", &sales(1)).unwrap();
        store.execute("create table made_in_sql as select 1 as x").unwrap();
        store.execute("create table another as select 2 as y").unwrap();

        assert_eq!(
            store.list_tables().unwrap(),
            vec!["zeta.csv", "alpha.csv", "another", "made_in_sql"]
        );

        store.execute("drop table \"zeta.csv\"").unwrap();
        assert_eq!(store.list_tables().unwrap(), vec!["alpha.csv", "another", "made_in_sql"]);
    }

    #[test]
    fn test_query_error_carries_engine_message() {
        let store = store();
        let err = store.execute("select * from nonexistent").unwrap_err();
        assert!(err.message.contains("nonexistent"), "{}", err.message);
    }

    #[test]
    fn test_empty_result_keeps_schema() {
        let mut store = store();
        store.register("sales.csv", &sales(3)).unwrap();
        let result = store.execute("select id, amount from \"sales.csv\" where id < 0").unwrap();
        assert_eq!(result.num_rows(), 0);
        assert_eq!(result.num_columns(), 2);
        assert_eq!(result.dataset.column_names(), vec!["id", "amount"]);
    }

    #[test]
    fn test_types_are_normalized() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("small", DataType::UInt8, true),
            Field::new("ratio", DataType::Float32, true),
            Field::new("day", DataType::Date32, true),
            Field::new("label", DataType::Utf8, true),
            Field::new("tags", DataType::Binary, true),
        ]));
        let batch = RecordBatch::try_new(schema, vec![
            Arc::new(UInt8Array::from(vec![Some(1), None])),
            Arc::new(Float32Array::from(vec![0.5, 1.5])),
            Arc::new(Date32Array::from(vec![Some(19723), None])),
            Arc::new(StringArray::from(vec![Some("a"), None])),
            Arc::new(BinaryArray::from(vec![Some(&b"ab"[..]), None])),
        ]).unwrap();

        let mut store = store();
        store.register("typed", &Dataset::new(batch)).unwrap();
        let ds = store.fetch_all("typed").unwrap();
        assert_eq!(ds.num_rows(), 2);

        let schema = ds.schema();
        let types: Vec<_> = schema.fields().iter().map(|f| f.data_type().clone()).collect();
        assert_eq!(types, vec![
            DataType::Int64,
            DataType::Float64,
            DataType::Date32,
            DataType::Utf8,
            DataType::Utf8,
        ]);

        let days = ds.column("day").unwrap().as_any().downcast_ref::<Date32Array>().unwrap();
        assert_eq!(days.value(0), 19723);
        assert!(days.is_null(1));
    }

    #[test]
    fn test_decimal_and_timestamp_columns_stay_queryable() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("price", DataType::Decimal128(10, 2), true),
            Field::new("sold_at", DataType::Timestamp(TimeUnit::Millisecond, None), true),
        ]));
        let prices = Decimal128Array::from(vec![Some(1250), Some(399), None])
            .with_precision_and_scale(10, 2)
            .unwrap();
        let sold_at = TimestampMillisecondArray::from(vec![
            Some(1_704_067_200_000),
            Some(1_704_153_600_000),
            None,
        ]);
        let batch = RecordBatch::try_new(schema, vec![Arc::new(prices), Arc::new(sold_at)]).unwrap();

        let mut store = store();
        store.register("p.parquet", &Dataset::new(batch)).unwrap();

        let result = store
            .execute("select sum(price) as total, max(sold_at) = timestamp '2024-01-02 00:00:00' as latest from \"p.parquet\"")
            .unwrap();
        let total = result.dataset.column("total").unwrap().as_any().downcast_ref::<Float64Array>().unwrap();
        assert!((total.value(0) - 16.49).abs() < 1e-9);
        let latest = result.dataset.column("latest").unwrap().as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(latest.value(0));

        let stored = store.fetch_all("p.parquet").unwrap();
        assert_eq!(
            stored.schema().field(1).data_type(),
            &DataType::Timestamp(TimeUnit::Microsecond, None)
        );
    }

    #[test]
    fn test_failed_append_leaves_no_table() {
        let mut store = store();
        let batch = normalize_batch(sales(3).batch()).unwrap();
        // one declared column for a two-column batch
        let result = create_and_fill(&mut store.conn, "CREATE TABLE \"short\" (id BIGINT);", "short", &batch);
        assert!(result.is_err());
        assert!(!store.table_exists("short").unwrap());

        assert_eq!(store.register("short", &sales(3)).unwrap(), RegisterOutcome::Created { rows: 3 });
        assert_eq!(store.row_count("short").unwrap(), 3);
    }

    #[test]
    fn test_zero_column_dataset_rejected() {
        let mut store = store();
        let empty = Dataset::empty(Arc::new(Schema::empty()));
        assert!(matches!(store.register("nothing", &empty), Err(DataError::NoColumns(_))));
    }
}
