//! Mapping result columns back to the table occurrences they were read from.
//!
//! The select list is walked position by position (`*`, `q.*`, `q.col`,
//! bare columns). When that cannot account for every result column, each
//! column is looked up by name among the tables the statement mentions, and
//! a single table with unknown columns takes every column.

use crate::metadata::MetadataProvider;
use crate::sql::{analyze, table_references, FromItem, SelectItem, SelectShape};
use tracing::debug;

/// Where one result column came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSource {
    /// Index of the table occurrence; each side of a self-join has its own
    pub occurrence: usize,
    pub table: String,
    pub column: String,
}

struct Occurrence {
    table: String,
    declared: Vec<String>,
}

impl Occurrence {
    fn new(name: &str, metadata: &dyn MetadataProvider) -> Self {
        let table = metadata.normalize_table_name(name);
        let declared = metadata.column_order(&table).unwrap_or_else(|e| {
            debug!(table = %table, "no column list: {e:#}");
            Vec::new()
        });
        Self { table, declared }
    }

    fn has_column(&self, name: &str) -> bool {
        self.declared.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    fn source(&self, occurrence: usize, name: &str) -> ColumnSource {
        let column = self
            .declared
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .map_or(name, String::as_str);
        ColumnSource {
            occurrence,
            table: self.table.clone(),
            column: column.to_string(),
        }
    }

    fn all_columns(&self, occurrence: usize) -> impl Iterator<Item = Option<ColumnSource>> + '_ {
        self.declared
            .iter()
            .map(move |c| Some(self.source(occurrence, c)))
    }
}

/// Attribute each of `result_columns` (the output of `sql`) to a table.
/// `None` marks a column that cannot be attributed.
pub fn attribute(
    sql: &str,
    result_columns: &[String],
    metadata: &dyn MetadataProvider,
) -> Vec<Option<ColumnSource>> {
    let shape = analyze(sql);

    if let Some(shape) = &shape {
        let occurrences: Vec<Option<Occurrence>> = shape
            .from
            .iter()
            .map(|item| item.table_name().map(|name| Occurrence::new(name, metadata)))
            .collect();

        match positional(shape, &occurrences) {
            Some(sources) if sources.len() == result_columns.len() => return sources,
            Some(sources) => debug!(
                expected = result_columns.len(),
                found = sources.len(),
                "select list does not line up with the result, matching by name"
            ),
            None => debug!("select list cannot be expanded, matching by name"),
        }
    }

    let names: Vec<String> = match &shape {
        Some(shape) => {
            let mut names: Vec<String> = Vec::new();
            for name in shape.from.iter().filter_map(FromItem::table_name) {
                if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                    names.push(name.to_string());
                }
            }
            names
        }
        None => table_references(sql),
    };
    let occurrences: Vec<Occurrence> = names
        .iter()
        .map(|name| Occurrence::new(name, metadata))
        .collect();

    by_name(result_columns, &occurrences)
}

/// Sources in select-list order, or `None` if a wildcard cannot be expanded
fn positional(
    shape: &SelectShape,
    occurrences: &[Option<Occurrence>],
) -> Option<Vec<Option<ColumnSource>>> {
    let find = |qualifier: &str| shape.from.iter().position(|f| f.is_referenced_as(qualifier));
    let expandable = |i: usize| occurrences[i].as_ref().filter(|o| !o.declared.is_empty());

    let mut sources = Vec::new();
    for item in &shape.items {
        match item {
            SelectItem::Wildcard => {
                for i in 0..occurrences.len() {
                    sources.extend(expandable(i)?.all_columns(i));
                }
            }
            SelectItem::QualifiedWildcard(qualifier) => {
                let i = find(qualifier)?;
                sources.extend(expandable(i)?.all_columns(i));
            }
            SelectItem::Column {
                qualifier: Some(qualifier),
                name,
            } => {
                let source = find(qualifier)
                    .and_then(|i| occurrences[i].as_ref().map(|o| o.source(i, name)));
                sources.push(source);
            }
            SelectItem::Column {
                qualifier: None,
                name,
            } => {
                let owners: Vec<usize> = (0..occurrences.len())
                    .filter(|&i| occurrences[i].as_ref().is_some_and(|o| o.has_column(name)))
                    .collect();
                let source = match (owners.as_slice(), occurrences) {
                    ([i], _) => occurrences[*i].as_ref().map(|o| o.source(*i, name)),
                    ([], [Some(only)]) if only.declared.is_empty() => Some(only.source(0, name)),
                    _ => None,
                };
                sources.push(source);
            }
            // Computed values are not stored values, even under a column's name
            SelectItem::Expression => sources.push(None),
        }
    }
    Some(sources)
}

fn by_name(result_columns: &[String], occurrences: &[Occurrence]) -> Vec<Option<ColumnSource>> {
    result_columns
        .iter()
        .map(|name| {
            let owners: Vec<usize> = (0..occurrences.len())
                .filter(|&i| occurrences[i].has_column(name))
                .collect();
            match (owners.as_slice(), occurrences) {
                ([i], _) => Some(occurrences[*i].source(*i, name)),
                ([], [only]) if only.declared.is_empty() => Some(only.source(0, name)),
                _ => None,
            }
        })
        .collect()
}
