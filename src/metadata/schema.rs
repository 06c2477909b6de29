//! Metadata answered from DDL text instead of a live catalog.

use super::{
    ColumnsMapping, ColumnsMappingGroup, MetadataProvider, ReferencedTable, ReferencedTableSet,
};
use crate::dialect::Dialect;
use crate::schema::{SchemaBuilder, SchemaGraph, TableSchema};
use anyhow::Result;

/// Provider over a schema parsed from `CREATE TABLE` / `ALTER TABLE`
/// statements. Unknown tables yield empty answers.
#[derive(Debug)]
pub struct SchemaMetadata {
    graph: SchemaGraph,
    dialect: Dialect,
}

impl SchemaMetadata {
    pub fn from_ddl(ddl: &str) -> Self {
        Self::from_ddl_with_dialect(ddl, Dialect::default())
    }

    /// `dialect` decides how unquoted table names are folded
    pub fn from_ddl_with_dialect(ddl: &str, dialect: Dialect) -> Self {
        Self {
            graph: SchemaGraph::from_schema(SchemaBuilder::from_script(ddl)),
            dialect,
        }
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    fn table(&self, name: &str) -> Option<&TableSchema> {
        self.graph.schema.get_table(name.trim_matches('"'))
    }
}

impl MetadataProvider for SchemaMetadata {
    fn not_null_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .table(table)
            .map(|t| {
                t.columns
                    .iter()
                    .filter(|c| !c.is_nullable)
                    .map(|c| c.name.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn column_order(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.table(table).map(TableSchema::column_names).unwrap_or_default())
    }

    fn foreign_keys(&self, table: &str) -> Result<ColumnsMappingGroup> {
        let Some(t) = self.table(table) else {
            return Ok(ColumnsMappingGroup::default());
        };

        let mappings = t
            .foreign_keys
            .iter()
            .flat_map(|fk| {
                let target_table = fk
                    .referenced_table_id
                    .and_then(|id| self.graph.table_name(id))
                    .unwrap_or(fk.referenced_table.as_str())
                    .to_string();
                fk.column_names
                    .iter()
                    .zip(&fk.referenced_columns)
                    .map(move |(source, target)| ColumnsMapping {
                        source_column: source.clone(),
                        target_table: target_table.clone(),
                        target_column: target.clone(),
                    })
            })
            .collect();

        Ok(ColumnsMappingGroup::new(mappings))
    }

    fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .table(table)
            .map(|t| t.primary_key.clone())
            .unwrap_or_default())
    }

    fn referenced_tables(&self, table: &str) -> Result<ReferencedTableSet> {
        let Some(t) = self.table(table) else {
            return Ok(ReferencedTableSet::default());
        };

        let entries = self
            .graph
            .ancestors_with_level(t.id)
            .into_iter()
            .filter_map(|(id, level)| {
                Some(ReferencedTable {
                    table: t.name.clone(),
                    referenced_table: self.graph.table_name(id)?.to_string(),
                    level,
                })
            })
            .collect();

        Ok(ReferencedTableSet::new(entries))
    }

    fn normalize_table_name(&self, table: &str) -> String {
        match self.table(table) {
            Some(t) => t.name.clone(),
            None => self.dialect.normalize_identifier(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDL: &str = "
        CREATE TABLE team (id INT PRIMARY KEY, name VARCHAR(20) NOT NULL);
        CREATE TABLE player (
            id INT NOT NULL,
            team_id INT REFERENCES team,
            PRIMARY KEY (id)
        );";

    #[test]
    fn test_implicit_reference_targets_primary_key() {
        let meta = SchemaMetadata::from_ddl(DDL);
        let fks = meta.foreign_keys("player").unwrap();
        let mapping = fks.find_mapping_for_column("team_id").unwrap();
        assert_eq!(mapping.target_table, "team");
        assert_eq!(mapping.target_column, "id");
    }

    #[test]
    fn test_unknown_table_is_empty() {
        let meta = SchemaMetadata::from_ddl(DDL);
        assert!(meta.column_order("nope").unwrap().is_empty());
        assert!(meta.foreign_keys("nope").unwrap().is_empty());
        assert_eq!(meta.normalize_table_name("PLAYER"), "player");
    }
}
