//! Embedded DuckDB database the fixtures are read from.
//!
//! Wraps a DuckDB connection and provides:
//! - typed query execution with bind parameters ([`Database::query`])
//! - script loading, including compressed scripts ([`Database::run_script`])
//! - NOT NULL backfill lookups for the closure engine ([`BackfillQuery`])

mod script;
mod types;

pub use script::{read_script, Compression};
pub use types::{from_text_form, from_value_ref, needs_text_form};

use crate::closure::BackfillQuery;
use crate::dialect::Dialect;
use crate::metadata::DuckDbMetadata;
use crate::query::SqlQuery;
use crate::row::Row;
use crate::value::Value;
use anyhow::{Context, Result};
use duckdb::{params_from_iter, Connection};
use std::path::Path;
use tracing::debug;

/// Result of a query execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// A DuckDB connection plus the helpers fixture generation needs
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to create in-memory DuckDB database")?;
        Ok(Self { conn })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB database: {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Another connection to the same database, for a concurrent request
    pub fn try_clone(&self) -> Result<Self> {
        let conn = self
            .conn
            .try_clone()
            .context("Failed to clone DuckDB connection")?;
        Ok(Self { conn })
    }

    /// Catalog metadata provider over this database
    pub fn metadata(&self) -> Result<DuckDbMetadata> {
        DuckDbMetadata::from_connection(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute one or more statements that return no rows
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .with_context(|| format!("Failed to execute: {}", abbreviate(sql)))
    }

    /// Execute a script file (`.sql`, optionally compressed)
    pub fn run_script(&self, path: &Path) -> Result<()> {
        let script = read_script(path)?;
        self.conn
            .execute_batch(&script)
            .with_context(|| format!("Failed to run script: {}", path.display()))
    }

    /// Execute a query and return typed results
    pub fn query(&self, query: &SqlQuery) -> Result<QueryResult> {
        let mut stmt = self
            .conn
            .prepare(&query.sql)
            .with_context(|| format!("Failed to prepare query: {}", query.sql))?;

        let mut rows_result = stmt
            .query(params_from_iter(query.params.iter()))
            .with_context(|| format!("Failed to execute query: {}", query.sql))?;

        let mut rows: Vec<Vec<Value>> = Vec::new();
        let mut column_count = 0;
        let mut text_forms = false;

        while let Some(row) = rows_result.next()? {
            if column_count == 0 {
                column_count = row.as_ref().column_count();
            }

            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value = row
                    .get_ref(i)
                    .with_context(|| format!("Failed to read column {} of: {}", i, query.sql))?;
                text_forms |= needs_text_form(&value);
                values.push(from_value_ref(value));
            }
            rows.push(values);
        }

        // Release the borrow on the statement before reading its column names
        drop(rows_result);

        let columns: Vec<String> = (0..stmt.column_count())
            .map(|i| {
                stmt.column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect();

        if text_forms {
            rows = self.query_text_forms(query, columns.len())?;
        }

        Ok(QueryResult { columns, rows })
    }

    /// Run `query` again, reading each column next to its text form and type
    /// name, so zoned temporal and nested values keep what DuckDB prints.
    fn query_text_forms(&self, query: &SqlQuery, width: usize) -> Result<Vec<Vec<Value>>> {
        let inner = query.sql.trim().trim_end_matches(';');
        let sql = format!(
            "SELECT *, CAST(COLUMNS(*) AS VARCHAR), typeof(COLUMNS(*)) FROM ({inner}) AS q"
        );
        debug!(sql = %sql, "re-reading columns through their text form");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("Failed to prepare query: {}", sql))?;
        let mut rows_result = stmt
            .query(params_from_iter(query.params.iter()))
            .with_context(|| format!("Failed to execute query: {}", sql))?;

        let mut rows = Vec::new();
        while let Some(row) = rows_result.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                let cell = row.get_ref(i)?;
                let text_form = needs_text_form(&cell);
                let native = from_value_ref(cell);
                if !text_form {
                    values.push(native);
                    continue;
                }
                let text: Option<String> = row.get(width + i)?;
                let type_name: String = row.get(2 * width + i)?;
                values.push(
                    text.and_then(|text| from_text_form(&type_name, text))
                        .unwrap_or(native),
                );
            }
            rows.push(values);
        }
        Ok(rows)
    }

    /// Tables of the current schema, sorted by name
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let result = self.query(&SqlQuery::new(
            "SELECT table_name FROM duckdb_tables() WHERE schema_name = current_schema() ORDER BY table_name",
        ))?;
        Ok(result
            .rows
            .into_iter()
            .filter_map(|mut r| match r.swap_remove(0) {
                Value::Text(name) => Some(name),
                _ => None,
            })
            .collect())
    }
}

impl BackfillQuery for Database {
    fn find_missing(&self, table: &str, missing: &[String], known: &Row) -> Result<Option<Row>> {
        let lookup = SqlQuery::lookup(
            table,
            missing,
            known,
            Some(Dialect::DuckDb.first_row_clauses()),
        );
        debug!(sql = %lookup.sql, "backfill lookup");

        let result = self.query(&lookup)?;
        let Some(values) = result.rows.into_iter().next() else {
            return Ok(None);
        };

        let mut found = Row::new(table);
        for (name, value) in result.columns.into_iter().zip(values) {
            found.set(name, value);
        }
        Ok(Some(found))
    }
}

fn abbreviate(sql: &str) -> String {
    const MAX: usize = 120;
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        format!("{}...", flat.chars().take(MAX).collect::<String>())
    }
}
