//! Foreign-key dependency graph over a parsed schema.

use super::{Schema, TableId};
use std::collections::VecDeque;

/// Schema dependency graph built from foreign key relationships.
///
/// - A parent is a table referenced by another table's FK
/// - A child is a table that has an FK referencing another table
///
/// Self-references are kept, so a self-referencing table is its own parent.
#[derive(Debug)]
pub struct SchemaGraph {
    pub schema: Schema,
    /// For each table, the tables it references via FK
    pub parents: Vec<Vec<TableId>>,
    /// For each table, the tables referencing it via FK
    pub children: Vec<Vec<TableId>>,
}

impl SchemaGraph {
    pub fn from_schema(schema: Schema) -> Self {
        let n = schema.len();
        let mut parents: Vec<Vec<TableId>> = vec![Vec::new(); n];
        let mut children: Vec<Vec<TableId>> = vec![Vec::new(); n];

        for table in schema.iter() {
            let child_id = table.id;
            for parent_id in table.foreign_keys.iter().filter_map(|fk| fk.referenced_table_id) {
                if !parents[child_id.0 as usize].contains(&parent_id) {
                    parents[child_id.0 as usize].push(parent_id);
                }
                if !children[parent_id.0 as usize].contains(&child_id) {
                    children[parent_id.0 as usize].push(child_id);
                }
            }
        }

        Self {
            schema,
            parents,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    pub fn table_name(&self, id: TableId) -> Option<&str> {
        self.schema.table(id).map(|t| t.name.as_str())
    }

    pub fn has_self_reference(&self, id: TableId) -> bool {
        self.parents[id.0 as usize].contains(&id)
    }

    /// Every table `id` depends on, with its distance in FK hops.
    ///
    /// Breadth-first, so each table is reported at its shortest distance.
    /// `id` itself appears only when it lies on a cycle.
    pub fn ancestors_with_level(&self, id: TableId) -> Vec<(TableId, usize)> {
        let mut found = Vec::new();
        let mut visited = vec![false; self.len()];
        let mut queue = VecDeque::new();
        queue.push_back((id, 0usize));

        while let Some((current, level)) = queue.pop_front() {
            for &parent in &self.parents[current.0 as usize] {
                if !visited[parent.0 as usize] {
                    visited[parent.0 as usize] = true;
                    found.push((parent, level + 1));
                    queue.push_back((parent, level + 1));
                }
            }
        }

        found
    }

    /// Check if `ancestor` is referenced by `descendant`, directly or transitively
    pub fn is_ancestor(&self, ancestor: TableId, descendant: TableId) -> bool {
        self.ancestors_with_level(descendant)
            .iter()
            .any(|&(id, _)| id == ancestor)
    }
}
