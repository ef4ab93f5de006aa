//! SQLite table source
//!
//! Rows are addressed by position in `rowid` order, matching the positional
//! row identity of the grid.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use async_trait::async_trait;
use arrow::datatypes::DataType;
use parking_lot::Mutex;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::json;
use tracing::debug;
use gv_core::{CellValue, Column, RemoteError, Row, RowDiff, TableResponse, TableSource};
use crate::DataError;

/// SQLite data source implementation
pub struct SqliteSource {
    name: String,
    table_name: String,
    columns: Arc<Vec<Column>>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSource {
    /// Open a table in a database file
    pub fn open<P: AsRef<Path>>(path: P, table_name: impl Into<String>) -> Result<Self, DataError> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn, table_name)
    }
    
    /// Wrap an already open connection
    pub fn from_connection(conn: Connection, table_name: impl Into<String>) -> Result<Self, DataError> {
        let table_name = table_name.into();
        let columns = Self::detect_columns(&conn, &table_name)?;
        
        Ok(Self {
            name: format!("sqlite:{}", table_name),
            table_name,
            columns: Arc::new(columns),
            conn: Arc::new(Mutex::new(conn)),
        })
    }
    
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
    
    /// Detect columns from `PRAGMA table_info`
    fn detect_columns(conn: &Connection, table_name: &str) -> Result<Vec<Column>, DataError> {
        let query = format!("PRAGMA table_info({})", quote_ident(table_name));
        let mut stmt = conn.prepare(&query)?;
        
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,     // cid
                row.get::<_, String>(1)?,  // column name
                row.get::<_, String>(2)?,  // declared type
            ))
        })?;
        
        let mut columns = Vec::new();
        for row_result in rows {
            let (cid, name, sqlite_type) = row_result?;
            columns.push(Column::new(name, arrow_type(&sqlite_type), cid as usize));
        }
        
        if columns.is_empty() {
            return Err(DataError::SchemaDetection(format!("Table '{}' has no columns", table_name)));
        }
        
        Ok(columns)
    }
    
    /// Run blocking database work off the async executor
    async fn with_connection<T, F>(&self, work: F) -> Result<T, RemoteError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &str, &[Column]) -> Result<T, RemoteError> + Send + 'static,
    {
        let conn = self.conn.clone();
        let table_name = self.table_name.clone();
        let columns = self.columns.clone();
        
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            work(&mut conn, &table_name, &columns)
        })
        .await
        .map_err(|e| RemoteError::generic("JoinError", e.to_string()))?
    }
}

#[async_trait]
impl TableSource for SqliteSource {
    async fn request_data(&self, row_offset: usize, count: usize) -> Result<TableResponse, RemoteError> {
        let started = Instant::now();
        
        let (rows, total) = self.with_connection(move |conn, table, columns| {
            let total = count_rows(conn, table)?;
            let rows = read_window(conn, table, columns, row_offset, count)?;
            Ok((rows, total))
        }).await?;
        
        debug!("Read {} rows at offset {} from {} (total {})", rows.len(), row_offset, self.table_name, total);
        
        Ok(TableResponse {
            status_message: format!("Fetched {} rows from {}", rows.len(), self.table_name),
            is_fully_loaded: row_offset + rows.len() >= total,
            rows,
            columns: self.columns.to_vec(),
            duration: Some(started.elapsed()),
        })
    }
    
    async fn save_changes(&self, diffs: &[RowDiff]) -> Result<TableResponse, RemoteError> {
        let started = Instant::now();
        let diffs = diffs.to_vec();
        
        let rows = self.with_connection(move |conn, table, columns| {
            save_rows(conn, table, columns, &diffs)
        }).await?;
        
        Ok(TableResponse {
            status_message: format!("Saved {} rows to {}", rows.len(), self.table_name),
            rows,
            columns: self.columns.to_vec(),
            is_fully_loaded: false,
            duration: Some(started.elapsed()),
        })
    }
    
    fn source_name(&self) -> &str {
        &self.name
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn arrow_type(sqlite_type: &str) -> DataType {
    match sqlite_type.to_uppercase().as_str() {
        "INTEGER" | "INT" | "BIGINT" => DataType::Int64,
        "REAL" | "FLOAT" | "DOUBLE" => DataType::Float64,
        "BOOLEAN" | "BOOL" => DataType::Boolean,
        "TEXT" | "VARCHAR" => DataType::Utf8,
        "DATE" | "DATETIME" | "TIMESTAMP" => DataType::Utf8, // Parse as string for now
        _ => DataType::Utf8, // Default to string
    }
}

fn sqlite_error(error: rusqlite::Error) -> RemoteError {
    match &error {
        rusqlite::Error::SqliteFailure(failure, _) => RemoteError::structured(
            format!("SQLite error: {}", error),
            Some(json!({
                "code": format!("{:?}", failure.code),
                "extended_code": failure.extended_code,
            })),
        ),
        _ => RemoteError::structured(format!("SQLite error: {}", error), None),
    }
}

fn to_sql_value(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Integer(i64::from(*b)),
        CellValue::Int(i) => Value::Integer(*i),
        CellValue::Float(f) => Value::Real(*f),
        CellValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_sql_value(value: ValueRef<'_>, data_type: &DataType) -> CellValue {
    match (value, data_type) {
        (ValueRef::Null, _) => CellValue::Null,
        (ValueRef::Integer(i), DataType::Boolean) => CellValue::Bool(i != 0),
        (ValueRef::Integer(i), _) => CellValue::Int(i),
        (ValueRef::Real(f), _) => CellValue::Float(f),
        (ValueRef::Text(s), _) => CellValue::Text(String::from_utf8_lossy(s).into_owned()),
        (ValueRef::Blob(b), _) => CellValue::Text(format!("<{} bytes>", b.len())),
    }
}

fn read_row(row: &rusqlite::Row<'_>, columns: &[Column]) -> rusqlite::Result<Row> {
    columns.iter()
        .enumerate()
        .map(|(idx, column)| row.get_ref(idx).map(|value| from_sql_value(value, &column.data_type)))
        .collect()
}

fn select_list(columns: &[Column]) -> String {
    columns.iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn count_rows(conn: &Connection, table: &str) -> Result<usize, RemoteError> {
    let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let count: i64 = conn.query_row(&query, [], |row| row.get(0)).map_err(sqlite_error)?;
    Ok(count as usize)
}

fn read_window(
    conn: &Connection,
    table: &str,
    columns: &[Column],
    offset: usize,
    count: usize,
) -> Result<Vec<Row>, RemoteError> {
    let query = format!(
        "SELECT {} FROM {} ORDER BY rowid LIMIT ?1 OFFSET ?2",
        select_list(columns),
        quote_ident(table)
    );
    let mut stmt = conn.prepare(&query).map_err(sqlite_error)?;
    let rows = stmt
        .query_map([count as i64, offset as i64], |row| read_row(row, columns))
        .map_err(sqlite_error)?;
    
    rows.collect::<rusqlite::Result<Vec<Row>>>().map_err(sqlite_error)
}

fn save_rows(
    conn: &mut Connection,
    table: &str,
    columns: &[Column],
    diffs: &[RowDiff],
) -> Result<Vec<Row>, RemoteError> {
    let table_ident = quote_ident(table);
    let rowid_query = format!("SELECT rowid FROM {} ORDER BY rowid LIMIT 1 OFFSET ?1", table_ident);
    let assignments = columns.iter()
        .enumerate()
        .map(|(idx, c)| format!("{} = ?{}", quote_ident(&c.name), idx + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let update = format!("UPDATE {} SET {} WHERE rowid = ?{}", table_ident, assignments, columns.len() + 1);
    let reselect = format!("SELECT {} FROM {} WHERE rowid = ?1", select_list(columns), table_ident);
    
    let tx = conn.transaction().map_err(sqlite_error)?;
    let mut saved = Vec::with_capacity(diffs.len());
    
    for diff in diffs {
        if diff.edited.len() != columns.len() {
            return Err(RemoteError::structured(
                format!("Row {} has {} cells, table has {} columns", diff.row_index, diff.edited.len(), columns.len()),
                None,
            ));
        }
        
        let rowid: i64 = tx
            .query_row(&rowid_query, [diff.row_index as i64], |row| row.get(0))
            .optional()
            .map_err(sqlite_error)?
            .ok_or_else(|| RemoteError::structured(
                format!("Row {} does not exist", diff.row_index),
                Some(json!({ "row_index": diff.row_index })),
            ))?;
        
        let mut params: Vec<Value> = diff.edited.iter().map(to_sql_value).collect();
        params.push(Value::Integer(rowid));
        tx.execute(&update, params_from_iter(params)).map_err(sqlite_error)?;
        
        let row = tx
            .query_row(&reselect, [rowid], |row| read_row(row, columns))
            .map_err(sqlite_error)?;
        saved.push(row);
    }
    
    tx.commit().map_err(sqlite_error)?;
    Ok(saved)
}
