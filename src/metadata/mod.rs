//! Schema facts the closure engine needs, behind one provider trait.
//!
//! Providers:
//! - [`DuckDbMetadata`]: live catalog of a DuckDB database
//! - [`SchemaMetadata`]: static facts parsed from DDL text
//! - [`CachedMetadata`]: memoizing wrapper around any provider

mod cache;
mod catalog;
mod schema;

pub use cache::CachedMetadata;
pub use catalog::DuckDbMetadata;
pub use schema::SchemaMetadata;

use ahash::AHashSet;
use anyhow::Result;
use std::collections::VecDeque;

/// `source_column` of a table references `target_table.target_column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnsMapping {
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

/// All outgoing foreign-key edges of one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnsMappingGroup {
    mappings: Vec<ColumnsMapping>,
}

impl ColumnsMappingGroup {
    pub fn new(mappings: Vec<ColumnsMapping>) -> Self {
        Self { mappings }
    }

    /// First edge leaving `column` (case-insensitive)
    pub fn find_mapping_for_column(&self, column: &str) -> Option<&ColumnsMapping> {
        self.mappings
            .iter()
            .find(|m| m.source_column.eq_ignore_ascii_case(column))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnsMapping> {
        self.mappings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }
}

/// `table` references `referenced_table` through a chain of `level` foreign keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedTable {
    pub table: String,
    pub referenced_table: String,
    pub level: usize,
}

/// Transitive references of one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencedTableSet {
    entries: Vec<ReferencedTable>,
}

impl ReferencedTableSet {
    pub fn new(entries: Vec<ReferencedTable>) -> Self {
        Self { entries }
    }

    pub fn references(&self, table: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.referenced_table.eq_ignore_ascii_case(table))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferencedTable> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Source of schema facts, keyed by table name.
///
/// Lookups for unknown tables return empty results rather than errors;
/// errors are reserved for failures talking to the catalog.
pub trait MetadataProvider: Send + Sync {
    /// Columns declared NOT NULL
    fn not_null_columns(&self, table: &str) -> Result<Vec<String>>;

    /// Every column, in declared order
    fn column_order(&self, table: &str) -> Result<Vec<String>>;

    fn foreign_keys(&self, table: &str) -> Result<ColumnsMappingGroup>;

    /// Primary-key columns, in key order
    fn primary_key_columns(&self, table: &str) -> Result<Vec<String>>;

    /// Tables reachable from `table` by following foreign keys.
    ///
    /// The provided implementation walks [`foreign_keys`](Self::foreign_keys)
    /// breadth-first; `table` itself is only included when it lies on a cycle.
    fn referenced_tables(&self, table: &str) -> Result<ReferencedTableSet> {
        let start = self.normalize_table_name(table);
        let mut seen: AHashSet<String> = AHashSet::new();
        let mut entries = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back((start.clone(), 0usize));

        while let Some((current, level)) = queue.pop_front() {
            for mapping in self.foreign_keys(&current)?.iter() {
                let target = self.normalize_table_name(&mapping.target_table);
                if seen.insert(target.to_lowercase()) {
                    entries.push(ReferencedTable {
                        table: start.clone(),
                        referenced_table: target.clone(),
                        level: level + 1,
                    });
                    queue.push_back((target, level + 1));
                }
            }
        }

        Ok(ReferencedTableSet::new(entries))
    }

    /// Catalog spelling of a user-supplied table name
    fn normalize_table_name(&self, table: &str) -> String;

    /// True when `from` depends on `to` directly or transitively.
    /// Lookup failures count as "no dependency".
    fn reaches(&self, from: &str, to: &str) -> bool {
        self.referenced_tables(from)
            .map(|set| set.references(to))
            .unwrap_or(false)
    }
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for std::sync::Arc<P> {
    fn not_null_columns(&self, table: &str) -> Result<Vec<String>> {
        (**self).not_null_columns(table)
    }

    fn column_order(&self, table: &str) -> Result<Vec<String>> {
        (**self).column_order(table)
    }

    fn foreign_keys(&self, table: &str) -> Result<ColumnsMappingGroup> {
        (**self).foreign_keys(table)
    }

    fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        (**self).primary_key_columns(table)
    }

    fn referenced_tables(&self, table: &str) -> Result<ReferencedTableSet> {
        (**self).referenced_tables(table)
    }

    fn normalize_table_name(&self, table: &str) -> String {
        (**self).normalize_table_name(table)
    }

    fn reaches(&self, from: &str, to: &str) -> bool {
        (**self).reaches(from, to)
    }
}
