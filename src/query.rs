//! Parameterized SQL text.

use crate::row::Row;
use crate::value::Value;

/// A statement plus its positional bind parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// `SELECT <columns> FROM <table> WHERE ..` matching every column of
    /// `known`: `col = ?` for values, `col IS NULL` for nulls.
    ///
    /// `first_row` is the dialect's `(prefix, suffix)` limiting the result
    /// to one row, when wanted.
    pub fn lookup(
        table: &str,
        columns: &[String],
        known: &Row,
        first_row: Option<(&str, &str)>,
    ) -> Self {
        let (prefix, suffix) = first_row.unwrap_or(("", ""));
        let mut sql = format!("SELECT {}{} FROM {}", prefix, columns.join(", "), table);
        let mut params = Vec::new();

        let predicates: Vec<String> = known
            .columns
            .iter()
            .map(|(name, value)| {
                if value.is_null() {
                    format!("{} IS NULL", name)
                } else {
                    params.push(value.clone());
                    format!("{} = ?", name)
                }
            })
            .collect();

        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }
        sql.push_str(suffix);

        Self { sql, params }
    }

    /// Query selecting exactly the columns and values of `row`
    pub fn from_row(row: &Row) -> Self {
        let columns: Vec<String> = row.columns.keys().cloned().collect();
        Self::lookup(&row.table, &columns, row, None)
    }
}

impl From<&str> for SqlQuery {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for SqlQuery {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}
