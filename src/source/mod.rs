//! Seed rows: the rows a statement reads or modifies, read from the database.

mod attribution;

pub use attribution::{attribute, ColumnSource};

use crate::database::{Database, QueryResult};
use crate::metadata::MetadataProvider;
use crate::query::SqlQuery;
use crate::row::Row;
use crate::sql::to_select;
use anyhow::Result;
use indexmap::IndexMap;
use tracing::debug;

/// Reads the seed rows of statements from a database
pub struct RowSource<'a> {
    database: &'a Database,
    metadata: &'a dyn MetadataProvider,
}

impl<'a> RowSource<'a> {
    pub fn new(database: &'a Database, metadata: &'a dyn MetadataProvider) -> Self {
        Self { database, metadata }
    }

    /// Rows touched by `query`, one per table occurrence and result row.
    ///
    /// Statements that cannot be turned into a SELECT yield no rows. A
    /// failing SELECT is an error.
    pub fn rows_for(&self, query: &SqlQuery) -> Result<Vec<Row>> {
        let Some(select) = to_select(&query.sql) else {
            debug!(sql = %query.sql, "statement does not read rows, skipping");
            return Ok(Vec::new());
        };

        let result = self
            .database
            .query(&SqlQuery::with_params(select.as_str(), query.params.clone()))?;
        if result.is_empty() {
            return Ok(Vec::new());
        }

        let sources = attribute(&select, &result.columns, self.metadata);
        for (name, source) in result.columns.iter().zip(&sources) {
            if source.is_none() {
                debug!(column = %name, "result column has no source table, skipping");
            }
        }

        Ok(rows_from_result(&result, &sources))
    }
}

/// Split every result row into one [`Row`] per table occurrence. Rows whose
/// values are all NULL (the missing side of an outer join) are dropped.
pub fn rows_from_result(result: &QueryResult, sources: &[Option<ColumnSource>]) -> Vec<Row> {
    let mut rows = Vec::new();
    for values in &result.rows {
        let mut by_occurrence: IndexMap<usize, Row> = IndexMap::new();
        for (value, source) in values.iter().zip(sources) {
            let Some(source) = source else {
                continue;
            };
            by_occurrence
                .entry(source.occurrence)
                .or_insert_with(|| Row::new(source.table.clone()))
                .set(source.column.clone(), value.clone());
        }
        rows.extend(
            by_occurrence
                .into_values()
                .filter(|row| row.columns.values().any(|v| !v.is_null())),
        );
    }
    rows
}
