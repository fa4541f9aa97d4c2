//! Read-only access to the measurement table.
//!
//! Every call opens its own connection, runs, and drops it again; nothing is
//! pooled or cached between turns.

pub mod import;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use tracing::debug;

use crate::config::StoreConfig;
use crate::models::{ARGO_COLUMNS, ARGO_TABLE, Cell, ResultSet};
use crate::policy::{has_multiple_statements, strip_trailing_semicolons};
use crate::utils::redaction::sanitize_error_text;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Execution failure as shown to the user. Already sanitized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct QueryExecutionError {
    message: String,
}

impl QueryExecutionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// `Database error: <detail>` with credentials scrubbed from the detail.
    #[must_use]
    pub fn database(detail: impl AsRef<str>) -> Self {
        Self::new(format!(
            "Database error: {}",
            sanitize_error_text(detail.as_ref())
        ))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<rusqlite::Error> for QueryExecutionError {
    fn from(error: rusqlite::Error) -> Self {
        Self::database(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

/// What the store found when it looked at the measurement table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescription {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub missing_columns: Vec<String>,
}

impl TableDescription {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_columns.is_empty()
    }
}

pub trait QueryStore {
    fn execute(&self, sql: &str) -> Result<ResultSet, QueryExecutionError>;

    fn record_count(&self) -> Result<u64, QueryExecutionError>;

    fn describe(&self) -> Result<TableDescription, QueryExecutionError>;
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    row_ceiling: usize,
}

impl SqliteStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, row_ceiling: usize) -> Self {
        Self {
            path: path.into(),
            row_ceiling: row_ceiling.max(1),
        }
    }

    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.database_path.clone(), config.row_ceiling)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn row_ceiling(&self) -> usize {
        self.row_ceiling
    }

    fn open(&self) -> Result<Connection, QueryExecutionError> {
        if !self.path.is_file() {
            return Err(QueryExecutionError::database(format!(
                "database file not found: {}",
                self.path.display()
            )));
        }
        let connection = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        connection.pragma_update(None, "query_only", true)?;
        Ok(connection)
    }
}

impl QueryStore for SqliteStore {
    fn execute(&self, sql: &str) -> Result<ResultSet, QueryExecutionError> {
        if has_multiple_statements(sql) {
            return Err(QueryExecutionError::database(
                "only one statement can be executed at a time",
            ));
        }
        let statement_text = strip_trailing_semicolons(sql);
        if statement_text.is_empty() {
            return Err(QueryExecutionError::database("empty statement"));
        }

        let started = Instant::now();
        let connection = self.open()?;
        let result = execute_capped(&connection, statement_text, self.row_ceiling)?;
        debug!(
            row_count = result.len(),
            truncated = result.truncated,
            duration_ms = started.elapsed().as_millis() as u64,
            "query executed"
        );
        Ok(result)
    }

    fn record_count(&self) -> Result<u64, QueryExecutionError> {
        let connection = self.open()?;
        let count = connection.query_row(
            &format!("SELECT COUNT(*) FROM {ARGO_TABLE}"),
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn describe(&self) -> Result<TableDescription, QueryExecutionError> {
        let connection = self.open()?;
        let mut statement =
            connection.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = statement
            .query_map([ARGO_TABLE], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    declared_type: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(QueryExecutionError::database(format!(
                "no such table: {ARGO_TABLE}"
            )));
        }

        let missing_columns = ARGO_COLUMNS
            .iter()
            .filter(|expected| {
                !columns
                    .iter()
                    .any(|column| column.name.eq_ignore_ascii_case(expected))
            })
            .map(ToString::to_string)
            .collect();

        Ok(TableDescription {
            table: ARGO_TABLE.to_string(),
            columns,
            missing_columns,
        })
    }
}

fn execute_capped(
    connection: &Connection,
    sql: &str,
    row_ceiling: usize,
) -> Result<ResultSet, QueryExecutionError> {
    let mut statement = connection.prepare(sql)?;
    if !statement.readonly() {
        return Err(QueryExecutionError::database(
            "statement would modify the database",
        ));
    }
    let columns = statement
        .column_names()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let mut rows = statement.query([])?;
    let mut result_rows = Vec::new();
    let mut truncated = false;
    while let Some(row) = rows.next()? {
        if result_rows.len() >= row_ceiling {
            truncated = true;
            break;
        }

        let mut cells = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            cells.push(cell_from_sql(row.get::<usize, SqlValue>(index)?));
        }
        result_rows.push(cells);
    }

    Ok(ResultSet::new(columns, result_rows, truncated))
}

fn cell_from_sql(value: SqlValue) -> Cell {
    match value {
        SqlValue::Null => Cell::Null,
        SqlValue::Integer(value) => Cell::Integer(value),
        SqlValue::Real(value) => Cell::Real(value),
        SqlValue::Text(value) => Cell::Text(value),
        SqlValue::Blob(value) => Cell::Text(encode_blob_hex(&value)),
    }
}

fn encode_blob_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push(HEX[(byte >> 4) as usize] as char);
        output.push(HEX[(byte & 0x0f) as usize] as char);
    }
    output
}
