//! DDL parsing for schema extraction.
//!
//! Parses CREATE TABLE and ALTER TABLE statements to extract:
//! - Column definitions, nullability and declared order
//! - Primary key constraints (inline and table-level)
//! - Foreign key constraints (table-level, inline `REFERENCES`, ALTER TABLE)

use super::{Column, ForeignKey, Schema, TableId, TableSchema};
use crate::sql::lexer::{split_statements, tokenize};
use once_cell::sync::Lazy;
use regex::Regex;

/// Supports: `table` (MySQL), "table" (PostgreSQL), [table] (MSSQL), table, schema.table
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*CREATE\s+(?:(?:GLOBAL\s+|LOCAL\s+)?(?:TEMP|TEMPORARY)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#)
        .unwrap()
});

static ALTER_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s]+)[\]`"]?"#).unwrap()
});

/// Column name and the first word(s) of its type
static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*[\[`"]?([^\[\]`"\s,]+)[\]`"]?\s+(\w+(?:\s*\([^)]+\))?(?:\s+unsigned)?)"#).unwrap()
});

/// Supports MSSQL CLUSTERED/NONCLUSTERED keywords: PRIMARY KEY CLUSTERED ([col])
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)PRIMARY\s+KEY\s*(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:CONSTRAINT\s+[\[`"]?([^\[\]`"\s]+)[\]`"]?\s+)?FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*(?:\(([^)]+)\))?"#,
    )
    .unwrap()
});

/// Column-level `REFERENCES parent [(col)]`
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bREFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*(?:\(([^)]+)\))?"#,
    )
    .unwrap()
});

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());

/// Builder for constructing schema from DDL statements
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every statement of a script; non-DDL statements are ignored
    pub fn from_script(script: &str) -> Schema {
        let mut builder = Self::new();
        for stmt in split_statements(script) {
            builder.parse_statement(skip_leading_comments(&stmt));
        }
        builder.build()
    }

    /// Dispatch one statement to the matching parser
    pub fn parse_statement(&mut self, stmt: &str) -> Option<TableId> {
        if CREATE_TABLE_NAME_RE.is_match(stmt) {
            self.parse_create_table(stmt)
        } else if ALTER_TABLE_NAME_RE.is_match(stmt) {
            self.parse_alter_table(stmt)
        } else {
            None
        }
    }

    /// Parse a CREATE TABLE statement and add to schema
    pub fn parse_create_table(&mut self, stmt: &str) -> Option<TableId> {
        let table_name = extract_create_table_name(stmt)?;

        if let Some(existing) = self.schema.get_table_id(&table_name) {
            return Some(existing);
        }

        let mut table = TableSchema::new(table_name, TableId(0));
        let body = extract_table_body(stmt)?;
        parse_table_body(&body, &mut table);

        Some(self.schema.add_table(table))
    }

    /// Parse an ALTER TABLE statement and update the existing table
    pub fn parse_alter_table(&mut self, stmt: &str) -> Option<TableId> {
        let table_name = extract_alter_table_name(stmt)?;
        let table_id = self.schema.get_table_id(&table_name)?;
        let table = self.schema.table_mut(table_id)?;

        table.foreign_keys.extend(parse_foreign_keys(stmt));
        if let Some(pk_cols) = parse_primary_key_constraint(stmt) {
            table.set_primary_key(pk_cols);
        }

        Some(table_id)
    }

    /// Finalize the schema, resolving FK references and implicit target columns
    pub fn build(mut self) -> Schema {
        self.schema.resolve_foreign_keys();

        let implicit: Vec<(usize, usize, Vec<String>)> = self
            .schema
            .iter()
            .enumerate()
            .flat_map(|(ti, table)| {
                table
                    .foreign_keys
                    .iter()
                    .enumerate()
                    .filter(|(_, fk)| fk.referenced_columns.is_empty())
                    .map(move |(fi, fk)| (ti, fi, fk.referenced_table_id))
            })
            .filter_map(|(ti, fi, target)| {
                let target = self.schema.table(target?)?;
                Some((ti, fi, target.primary_key.clone()))
            })
            .collect();

        // `REFERENCES parent` without columns targets the parent's primary key
        for (ti, fi, pk) in implicit {
            self.schema.table_schemas[ti].foreign_keys[fi].referenced_columns = pk;
        }

        self.schema
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

fn skip_leading_comments(stmt: &str) -> &str {
    tokenize(stmt).first().map_or("", |t| &stmt[t.start..])
}

pub fn extract_create_table_name(stmt: &str) -> Option<String> {
    CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn extract_alter_table_name(stmt: &str) -> Option<String> {
    ALTER_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the body of a CREATE TABLE statement (between first ( and matching ))
fn extract_table_body(stmt: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;

    for (i, ch) in stmt.char_indices() {
        if ch == '\'' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }

        match ch {
            '(' => {
                if depth == 0 {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| stmt[s..i].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

fn is_constraint_clause(upper: &str) -> bool {
    [
        "PRIMARY KEY",
        "CONSTRAINT",
        "FOREIGN KEY",
        "KEY ",
        "INDEX ",
        "UNIQUE ",
        "UNIQUE(",
        "FULLTEXT ",
        "SPATIAL ",
        "CHECK ",
        "CHECK(",
    ]
    .iter()
    .any(|prefix| upper.starts_with(prefix))
}

fn parse_table_body(body: &str, table: &mut TableSchema) {
    for part in split_table_body(body) {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_constraint_clause(&trimmed.to_uppercase()) {
            if let Some(pk_cols) = parse_primary_key_constraint(trimmed) {
                table.set_primary_key(pk_cols);
            }
            table.foreign_keys.extend(parse_foreign_keys(trimmed));
            continue;
        }

        let Some(mut col) = parse_column_def(trimmed, table.columns.len()) else {
            continue;
        };

        if INLINE_PRIMARY_KEY_RE.is_match(trimmed) {
            col.is_primary_key = true;
            col.is_nullable = false;
            table.primary_key.push(col.name.clone());
        }

        if let Some(caps) = INLINE_REFERENCES_RE.captures(trimmed) {
            table.foreign_keys.push(ForeignKey {
                name: None,
                column_names: vec![col.name.clone()],
                referenced_table: caps[1].to_string(),
                referenced_columns: caps
                    .get(2)
                    .map(|m| parse_column_list(m.as_str()))
                    .unwrap_or_default(),
                referenced_table_id: None,
            });
        }

        table.columns.push(col);
    }
}

/// Split table body by commas, respecting nested parentheses and string literals
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;

    for ch in body.chars() {
        if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
            continue;
        }

        if in_string {
            current.push(ch);
            continue;
        }

        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

fn parse_column_def(def: &str, ordinal: usize) -> Option<Column> {
    let caps = COLUMN_DEF_RE.captures(def)?;

    Some(Column {
        name: caps.get(1)?.as_str().to_string(),
        sql_type: caps.get(2)?.as_str().to_string(),
        ordinal,
        is_primary_key: false,
        is_nullable: !NOT_NULL_RE.is_match(def),
    })
}

/// Parse PRIMARY KEY constraint, returns column names
fn parse_primary_key_constraint(constraint: &str) -> Option<Vec<String>> {
    let caps = PRIMARY_KEY_RE.captures(constraint)?;
    Some(parse_column_list(caps.get(1)?.as_str()))
}

fn parse_foreign_keys(stmt: &str) -> Vec<ForeignKey> {
    FOREIGN_KEY_RE
        .captures_iter(stmt)
        .filter_map(|caps| {
            let column_names = parse_column_list(caps.get(2)?.as_str());
            let referenced_table = caps.get(3)?.as_str().to_string();
            if column_names.is_empty() || referenced_table.is_empty() {
                return None;
            }
            Some(ForeignKey {
                name: caps.get(1).map(|m| m.as_str().to_string()),
                column_names,
                referenced_table,
                referenced_columns: caps
                    .get(4)
                    .map(|m| parse_column_list(m.as_str()))
                    .unwrap_or_default(),
                referenced_table_id: None,
            })
        })
        .collect()
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets)
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| {
            c.trim()
                .trim_matches('`')
                .trim_matches('"')
                .trim_matches('[')
                .trim_matches(']')
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_table_body_skips_strings() {
        let body = extract_table_body("CREATE TABLE t (a VARCHAR(3) DEFAULT '(', b INT)").unwrap();
        assert_eq!(body, "a VARCHAR(3) DEFAULT '(', b INT");
    }

    #[test]
    fn test_commented_statement_is_parsed() {
        let schema = SchemaBuilder::from_script("-- users\n/* v2 */ CREATE TABLE users (id INT);");
        assert!(schema.get_table("users").is_some());
    }

    #[test]
    fn test_constraint_clause_detection() {
        assert!(is_constraint_clause("PRIMARY KEY (ID)"));
        assert!(is_constraint_clause("UNIQUE(EMAIL)"));
        assert!(!is_constraint_clause("KEYWORD VARCHAR(10)"));
    }
}
