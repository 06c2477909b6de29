//! Closure of a set of seed rows under the schema's constraints.
//!
//! Every admitted row gets its NOT NULL columns filled in from the database
//! (best effort) and pulls in one row per foreign-key value it holds, until
//! no new row appears. Rows describing the same record are merged as they
//! arrive, so the result holds one row per record.
//!
//! Work is driven by an explicit stack rather than recursion: rows are
//! processed depth-first in discovery order, which keeps the order of the
//! admitted rows deterministic for a given input.

mod backfill;

pub use backfill::{BackfillQuery, NoBackfill};

use crate::metadata::{ColumnsMappingGroup, MetadataProvider};
use crate::row::{try_merge, Row};
use ahash::AHashSet;
use serde::Serialize;
use tracing::{debug, warn};

/// Longest chain of foreign keys followed from a seed row
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Counters collected while closing a row set
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ClosureStats {
    pub rows_admitted: usize,
    pub rows_merged: usize,
    pub backfill_queries: usize,
    pub backfill_misses: usize,
    pub edges_followed: usize,
    /// Foreign keys left unfollowed because the depth bound was reached
    pub edges_truncated: usize,
    pub warnings: Vec<String>,
}

impl std::fmt::Display for ClosureStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows ({} merged), {} foreign keys followed, {}/{} backfills missed",
            self.rows_admitted,
            self.rows_merged,
            self.edges_followed,
            self.backfill_misses,
            self.backfill_queries
        )?;
        if self.edges_truncated > 0 {
            write!(f, ", {} foreign keys truncated", self.edges_truncated)?;
        }
        Ok(())
    }
}

/// Result of a closure: rows in admission order plus statistics
#[derive(Debug, Clone, Default)]
pub struct ClosedRows {
    pub rows: Vec<Row>,
    pub stats: ClosureStats,
}

/// Incrementally closes rows added through [`add`](Self::add).
///
/// Cyclic foreign-key graphs are handled two ways: a foreign-key value is
/// expanded at most once (`(table, column, value)` is remembered), and no
/// chain longer than `max_depth` is followed. Truncated edges are counted in
/// [`ClosureStats::edges_truncated`] and the rows gathered so far are kept.
pub struct ClosureBuilder<'a> {
    metadata: &'a dyn MetadataProvider,
    backfill: &'a dyn BackfillQuery,
    max_depth: usize,
    rows: Vec<Row>,
    expanded: AHashSet<(String, String, String)>,
    stats: ClosureStats,
}

impl<'a> ClosureBuilder<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider, backfill: &'a dyn BackfillQuery) -> Self {
        Self {
            metadata,
            backfill,
            max_depth: DEFAULT_MAX_DEPTH,
            rows: Vec::new(),
            expanded: AHashSet::new(),
            stats: ClosureStats::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Close a batch of seed rows in one call
    pub fn close(
        metadata: &'a dyn MetadataProvider,
        backfill: &'a dyn BackfillQuery,
        seeds: impl IntoIterator<Item = Row>,
    ) -> ClosedRows {
        let mut builder = Self::new(metadata, backfill);
        builder.add_all(seeds);
        builder.finish()
    }

    pub fn add_all(&mut self, rows: impl IntoIterator<Item = Row>) {
        for row in rows {
            self.add(row);
        }
    }

    /// Add one row and everything it transitively requires
    pub fn add(&mut self, row: Row) {
        let mut pending = vec![(row, 0usize)];

        while let Some((mut row, depth)) = pending.pop() {
            row.table = self.metadata.normalize_table_name(&row.table);

            if let Some(index) = try_merge(&row, &mut self.rows) {
                debug!(table = %row.table, index, "merged into existing row");
                self.stats.rows_merged += 1;
                // The merge may have filled in foreign-key columns
                let merged = self.rows[index].clone();
                let referenced = self.referenced_rows(&merged, depth);
                pending.extend(referenced.into_iter().rev().map(|r| (r, depth + 1)));
                continue;
            }

            self.backfill_not_null(&mut row);
            let referenced = self.referenced_rows(&row, depth);

            self.rows.push(row);
            self.stats.rows_admitted += 1;

            // Reversed so the first foreign key is processed first
            pending.extend(referenced.into_iter().rev().map(|r| (r, depth + 1)));
        }
    }

    /// Rows admitted so far, in admission order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn stats(&self) -> &ClosureStats {
        &self.stats
    }

    pub fn finish(self) -> ClosedRows {
        ClosedRows {
            rows: self.rows,
            stats: self.stats,
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.stats.warnings.push(message);
    }

    fn backfill_not_null(&mut self, row: &mut Row) {
        let not_null = match self.metadata.not_null_columns(&row.table) {
            Ok(columns) => columns,
            Err(e) => {
                self.warn(format!("Cannot read NOT NULL columns of {}: {:#}", row.table, e));
                return;
            }
        };

        let missing = row.missing_columns(&not_null);
        if missing.is_empty() || row.is_empty() {
            return;
        }

        self.stats.backfill_queries += 1;
        match self.backfill.find_missing(&row.table, &missing, row) {
            Ok(Some(found)) => {
                row.merge_from(&found);
            }
            Ok(None) => {
                self.stats.backfill_misses += 1;
                debug!(table = %row.table, ?missing, "no stored row to backfill from");
            }
            Err(e) => {
                self.stats.backfill_misses += 1;
                self.warn(format!(
                    "Backfill of {} ({}) failed, leaving NULL: {:#}",
                    row.table,
                    missing.join(", "),
                    e
                ));
            }
        }
    }

    /// One single-column row per non-null foreign-key value of `row`
    fn referenced_rows(&mut self, row: &Row, depth: usize) -> Vec<Row> {
        let mappings = match self.metadata.foreign_keys(&row.table) {
            Ok(group) => group,
            Err(e) => {
                self.warn(format!("Cannot read foreign keys of {}: {:#}", row.table, e));
                ColumnsMappingGroup::default()
            }
        };
        if mappings.is_empty() {
            return Vec::new();
        }

        let mut referenced = Vec::new();
        for (column, value) in &row.columns {
            if value.is_null() {
                continue;
            }
            let Some(mapping) = mappings.find_mapping_for_column(column) else {
                continue;
            };

            let key = (
                mapping.target_table.to_lowercase(),
                mapping.target_column.to_lowercase(),
                value.to_plain_string(),
            );
            if self.expanded.contains(&key) {
                continue;
            }
            if depth >= self.max_depth {
                self.stats.edges_truncated += 1;
                self.warn(format!(
                    "Not following {}.{} -> {}.{} = {}: depth limit {} reached",
                    row.table,
                    column,
                    mapping.target_table,
                    mapping.target_column,
                    value,
                    self.max_depth
                ));
                continue;
            }

            self.expanded.insert(key);
            self.stats.edges_followed += 1;
            referenced.push(
                Row::new(mapping.target_table.clone())
                    .with(mapping.target_column.clone(), value.clone()),
            );
        }
        referenced
    }
}
