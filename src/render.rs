//! INSERT statement rendering.

use crate::dialect::Dialect;
use crate::row::Row;

/// Renders rows as `INSERT INTO t(c1, c2) VALUES(v1, v2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertRenderer {
    dialect: Dialect,
}

impl InsertRenderer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// One statement, without terminator
    pub fn render(&self, row: &Row) -> String {
        let names: Vec<&str> = row.columns.keys().map(String::as_str).collect();
        let values: Vec<String> = row
            .columns
            .values()
            .map(|v| self.dialect.format_value(v))
            .collect();
        format!(
            "INSERT INTO {}({}) VALUES({})",
            row.table,
            names.join(", "),
            values.join(", ")
        )
    }

    pub fn render_list(&self, rows: &[Row]) -> Vec<String> {
        rows.iter().map(|r| self.render(r)).collect()
    }

    /// Every statement followed by `;` and a newline
    pub fn render_script(&self, rows: &[Row]) -> String {
        let mut script = String::new();
        for row in rows {
            script.push_str(&self.render(row));
            script.push_str(";\n");
        }
        script
    }
}
