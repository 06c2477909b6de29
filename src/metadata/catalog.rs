//! Metadata read from a live DuckDB catalog.

use super::{ColumnsMapping, ColumnsMappingGroup, MetadataProvider};
use anyhow::{Context, Result};
use duckdb::Connection;
use std::sync::{Mutex, PoisonError};

const NOT_NULL_SQL: &str = "SELECT column_name FROM duckdb_columns() \
     WHERE lower(table_name) = lower(?) AND schema_name = current_schema() AND NOT is_nullable \
     ORDER BY column_index";

const COLUMN_ORDER_SQL: &str = "SELECT column_name FROM duckdb_columns() \
     WHERE lower(table_name) = lower(?) AND schema_name = current_schema() \
     ORDER BY column_index";

const PRIMARY_KEY_SQL: &str = "SELECT unnest(constraint_column_names) FROM duckdb_constraints() \
     WHERE lower(table_name) = lower(?) AND schema_name = current_schema() \
     AND constraint_type = 'PRIMARY KEY'";

const FOREIGN_KEY_SQL: &str = "SELECT unnest(constraint_column_names), referenced_table, \
     unnest(referenced_column_names) FROM duckdb_constraints() \
     WHERE lower(table_name) = lower(?) AND schema_name = current_schema() \
     AND constraint_type = 'FOREIGN KEY' \
     ORDER BY constraint_index";

const TABLE_NAME_SQL: &str = "SELECT table_name FROM duckdb_tables() \
     WHERE lower(table_name) = lower(?) AND schema_name = current_schema() LIMIT 1";

/// Catalog queries against `duckdb_columns()` and `duckdb_constraints()`.
///
/// Owns its own connection (usually a `try_clone` of the request
/// connection) so it can be shared across threads behind a mutex.
pub struct DuckDbMetadata {
    conn: Mutex<Connection>,
}

impl DuckDbMetadata {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open a second handle on the same database as `conn`
    pub fn from_connection(conn: &Connection) -> Result<Self> {
        let clone = conn
            .try_clone()
            .context("Failed to clone DuckDB connection for catalog queries")?;
        Ok(Self::new(clone))
    }

    fn strings(&self, sql: &str, table: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn
            .prepare(sql)
            .with_context(|| format!("Failed to prepare catalog query: {}", sql))?;
        let rows = stmt
            .query_map([table], |row| row.get::<_, String>(0))
            .with_context(|| format!("Failed to read catalog for table {}", table))?;
        rows.collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read catalog for table {}", table))
    }
}

impl MetadataProvider for DuckDbMetadata {
    fn not_null_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut columns = self.strings(NOT_NULL_SQL, table)?;
        // Primary-key columns are implicitly NOT NULL
        for pk in self.primary_key_columns(table)? {
            if !columns.iter().any(|c| c.eq_ignore_ascii_case(&pk)) {
                columns.push(pk);
            }
        }
        Ok(columns)
    }

    fn column_order(&self, table: &str) -> Result<Vec<String>> {
        self.strings(COLUMN_ORDER_SQL, table)
    }

    fn foreign_keys(&self, table: &str) -> Result<ColumnsMappingGroup> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn
            .prepare(FOREIGN_KEY_SQL)
            .context("Failed to prepare foreign key query")?;
        let rows = stmt
            .query_map([table], |row| {
                Ok(ColumnsMapping {
                    source_column: row.get(0)?,
                    target_table: row.get(1)?,
                    target_column: row.get(2)?,
                })
            })
            .with_context(|| format!("Failed to read foreign keys of {}", table))?;
        let mappings = rows
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read foreign keys of {}", table))?;
        Ok(ColumnsMappingGroup::new(mappings))
    }

    fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        self.strings(PRIMARY_KEY_SQL, table)
    }

    fn normalize_table_name(&self, table: &str) -> String {
        let trimmed = table.trim().trim_matches('"');
        match self.strings(TABLE_NAME_SQL, trimmed) {
            Ok(mut names) if !names.is_empty() => names.swap_remove(0),
            _ => trimmed.to_string(),
        }
    }
}
