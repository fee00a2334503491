//! Relational Store Module
//! An explicit SQLite handle: tables are replaced wholesale, queries come
//! back as Polars DataFrames.

use chrono::DateTime;
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("No table named '{0}' in the store")]
    UnknownTable(String),
}

/// SQLite-backed store, opened once per run and released on `close` or drop.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the database file with an exclusive lock.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "locking_mode", "EXCLUSIVE")?;
        debug!("Opened store {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop and recreate `name` from `df` inside one transaction, so a
    /// failure leaves the previous table untouched. Returns rows written.
    pub fn replace_table(&mut self, name: &str, df: &DataFrame) -> Result<usize, StoreError> {
        let mut columns: Vec<(String, SqlColumn)> = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            columns.push((column.name().to_string(), SqlColumn::from_column(column)?));
        }

        let create_sql = format!(
            "CREATE TABLE {} ({})",
            quote_ident(name),
            columns
                .iter()
                .map(|(col, typed)| format!("{} {}", quote_ident(col), typed.sql_type()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let insert_sql = format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(name),
            (1..=columns.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)), [])?;
        tx.execute(&create_sql, [])?;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            // One row of SQL values alive at a time
            for row in 0..df.height() {
                stmt.execute(params_from_iter(columns.iter().map(|(_, typed)| typed.value(row))))?;
            }
        }
        tx.commit()?;

        info!("Stored table {} ({} rows)", name, df.height());
        Ok(df.height())
    }

    pub fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Read a whole table back.
    pub fn read_table(&self, name: &str) -> Result<DataFrame, StoreError> {
        if !self.table_exists(name)? {
            return Err(StoreError::UnknownTable(name.to_string()));
        }
        self.query_frame(&format!("SELECT * FROM {}", quote_ident(name)))
    }

    /// Run a query and collect the result as a DataFrame.
    ///
    /// Column types follow the values: all integers -> Int64, any real ->
    /// Float64, any text -> String. All-null columns become Float64.
    pub fn query_frame(&self, sql: &str) -> Result<DataFrame, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut cells: Vec<Vec<Value>> = vec![Vec::new(); names.len()];

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, cell) in cells.iter_mut().enumerate() {
                cell.push(row.get::<_, Value>(idx)?);
            }
        }

        let columns: Vec<Column> = names
            .iter()
            .zip(cells)
            .map(|(name, values)| frame_column(name, values))
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    /// Release the connection, reporting any error from closing it.
    pub fn close(self) -> Result<(), StoreError> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
        debug!("Closed store {}", path.display());
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn format_timestamp(raw: i64, unit: TimeUnit) -> Option<String> {
    let millis = match unit {
        TimeUnit::Nanoseconds => raw.div_euclid(1_000_000),
        TimeUnit::Microseconds => raw.div_euclid(1_000),
        TimeUnit::Milliseconds => raw,
    };
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Typed view of one DataFrame column, read a cell at a time while inserting.
enum SqlColumn {
    Bool(BooleanChunked),
    Int(Int64Chunked),
    Real(Float64Chunked),
    Timestamp(Int64Chunked, TimeUnit),
    Text(StringChunked),
}

impl SqlColumn {
    fn from_column(column: &Column) -> PolarsResult<Self> {
        let series = column.as_materialized_series();
        Ok(match series.dtype() {
            DataType::Boolean => SqlColumn::Bool(series.bool()?.clone()),
            DataType::Datetime(unit, _) => {
                let unit = *unit;
                SqlColumn::Timestamp(series.cast(&DataType::Int64)?.i64()?.clone(), unit)
            }
            DataType::Int64 => SqlColumn::Int(series.i64()?.clone()),
            dt if dt.is_integer() => SqlColumn::Int(series.cast(&DataType::Int64)?.i64()?.clone()),
            DataType::Float64 => SqlColumn::Real(series.f64()?.clone()),
            dt if dt.is_float() => SqlColumn::Real(series.cast(&DataType::Float64)?.f64()?.clone()),
            DataType::String => SqlColumn::Text(series.str()?.clone()),
            _ => SqlColumn::Text(series.cast(&DataType::String)?.str()?.clone()),
        })
    }

    fn sql_type(&self) -> &'static str {
        match self {
            SqlColumn::Bool(_) | SqlColumn::Int(_) => "INTEGER",
            SqlColumn::Real(_) => "REAL",
            SqlColumn::Timestamp(..) | SqlColumn::Text(_) => "TEXT",
        }
    }

    fn value(&self, row: usize) -> Value {
        let value = match self {
            SqlColumn::Bool(ca) => ca.get(row).map(|b| Value::Integer(b as i64)),
            SqlColumn::Int(ca) => ca.get(row).map(Value::Integer),
            SqlColumn::Real(ca) => ca.get(row).map(Value::Real),
            SqlColumn::Timestamp(ca, unit) => ca
                .get(row)
                .and_then(|ts| format_timestamp(ts, *unit))
                .map(Value::Text),
            SqlColumn::Text(ca) => ca.get(row).map(|s| Value::Text(s.to_string())),
        };
        value.unwrap_or(Value::Null)
    }
}

fn frame_column(name: &str, values: Vec<Value>) -> Column {
    let name = PlSmallStr::from(name);
    let has_text = values
        .iter()
        .any(|v| matches!(v, Value::Text(_) | Value::Blob(_)));
    let has_real = values.iter().any(|v| matches!(v, Value::Real(_)));
    let has_int = values.iter().any(|v| matches!(v, Value::Integer(_)));

    if has_text {
        let text: Vec<Option<String>> = values
            .into_iter()
            .map(|v| match v {
                Value::Null => None,
                Value::Integer(i) => Some(i.to_string()),
                Value::Real(f) => Some(f.to_string()),
                Value::Text(s) => Some(s),
                Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
            })
            .collect();
        Column::new(name, text)
    } else if has_int && !has_real {
        let ints: Vec<Option<i64>> = values
            .into_iter()
            .map(|v| match v {
                Value::Integer(i) => Some(i),
                _ => None,
            })
            .collect();
        Column::new(name, ints)
    } else {
        let floats: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| match v {
                Value::Integer(i) => Some(i as f64),
                Value::Real(f) => Some(f),
                _ => None,
            })
            .collect();
        Column::new(name, floats)
    }
}
