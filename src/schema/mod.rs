//! Table definitions recovered from DDL text.
//!
//! This module provides:
//! - Data models for tables, columns, primary and foreign keys
//! - A lenient CREATE TABLE / ALTER TABLE parser ([`SchemaBuilder`])
//! - The foreign-key dependency graph ([`SchemaGraph`])

mod ddl;
mod graph;

pub use ddl::*;
pub use graph::*;

use ahash::AHashMap;
use std::fmt;

/// Unique identifier for a table within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Column definition within a table
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// Declared type, verbatim (`DECIMAL(5,2)`)
    pub sql_type: String,
    /// Position in table (0-indexed)
    pub ordinal: usize,
    pub is_primary_key: bool,
    pub is_nullable: bool,
}

/// Foreign key constraint; `column_names[i]` references `referenced_columns[i]`
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub column_names: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    /// Resolved once the whole schema is known
    pub referenced_table_id: Option<TableId>,
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub id: TableId,
    pub columns: Vec<Column>,
    /// Primary key column names, in key order
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    pub fn new(name: String, id: TableId) -> Self {
        Self {
            name,
            id,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Get a column by name (case-insensitive)
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Mark columns as the primary key; key columns are implicitly NOT NULL
    pub fn set_primary_key(&mut self, names: Vec<String>) {
        for name in &names {
            if let Some(col) = self.get_column_mut(name) {
                col.is_primary_key = true;
                col.is_nullable = false;
            }
        }
        self.primary_key = names;
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Complete database schema
#[derive(Debug, Default)]
pub struct Schema {
    /// Map from lowercased table name to table ID
    pub tables: AHashMap<String, TableId>,
    /// Table schemas indexed by TableId
    pub table_schemas: Vec<TableSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get table ID by name (case-insensitive)
    pub fn get_table_id(&self, name: &str) -> Option<TableId> {
        self.tables.get(&name.to_lowercase()).copied()
    }

    pub fn table(&self, id: TableId) -> Option<&TableSchema> {
        self.table_schemas.get(id.0 as usize)
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut TableSchema> {
        self.table_schemas.get_mut(id.0 as usize)
    }

    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.get_table_id(name).and_then(|id| self.table(id))
    }

    /// Add a new table schema, returning its ID
    pub fn add_table(&mut self, mut schema: TableSchema) -> TableId {
        let id = TableId(self.table_schemas.len() as u32);
        schema.id = id;
        self.tables.insert(schema.name.to_lowercase(), id);
        self.table_schemas.push(schema);
        id
    }

    /// Resolve all foreign key references to table IDs
    pub fn resolve_foreign_keys(&mut self) {
        let table_ids = self.tables.clone();
        for table in &mut self.table_schemas {
            for fk in &mut table.foreign_keys {
                fk.referenced_table_id = table_ids.get(&fk.referenced_table.to_lowercase()).copied();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table_schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table_schemas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableSchema> {
        self.table_schemas.iter()
    }
}
