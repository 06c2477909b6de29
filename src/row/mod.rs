//! Dataset rows and the merge rule that keeps one row per logical record.

use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// One row of one table, with a possibly partial set of column values.
///
/// Column order is insertion order until the orderer re-sorts it into the
/// table's declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub table: String,
    pub columns: IndexMap<String, Value>,
}

impl Row {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: IndexMap::new(),
        }
    }

    /// Builder-style column assignment
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.columns.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Value of a column, matching the name case-insensitively
    pub fn get_ignore_case(&self, column: &str) -> Option<&Value> {
        self.columns.get(column).or_else(|| {
            self.columns
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(column))
                .map(|(_, v)| v)
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns that are absent or null in this row, among `wanted`
    pub fn missing_columns(&self, wanted: &[String]) -> Vec<String> {
        wanted
            .iter()
            .filter(|c| self.get_ignore_case(c).map_or(true, Value::is_null))
            .cloned()
            .collect()
    }

    /// Two rows may describe the same record: same table, and no column that
    /// is non-null on both sides disagrees.
    pub fn is_mergeable_with(&self, other: &Row) -> bool {
        if !self.table.eq_ignore_ascii_case(&other.table) {
            return false;
        }
        self.columns.iter().all(|(name, value)| {
            if value.is_null() {
                return true;
            }
            match other.get_ignore_case(name) {
                Some(v) if !v.is_null() => v == value,
                _ => true,
            }
        })
    }

    /// Copy every non-null column of `other` that is absent or null here.
    /// Existing non-null values are never overwritten.
    ///
    /// Returns the number of columns filled in.
    pub fn merge_from(&mut self, other: &Row) -> usize {
        let mut filled = 0;
        for (name, value) in &other.columns {
            if value.is_null() {
                continue;
            }
            let key = self
                .columns
                .keys()
                .find(|k| k.eq_ignore_ascii_case(name))
                .cloned();
            match key {
                Some(key) => {
                    if let Some(slot) = self.columns.get_mut(&key) {
                        if slot.is_null() {
                            *slot = value.clone();
                            filled += 1;
                        }
                    }
                }
                None => {
                    self.columns.insert(name.clone(), value.clone());
                    filled += 1;
                }
            }
        }
        filled
    }

    /// Reorder columns so declared columns come first in declared order.
    /// Undeclared columns keep their relative order at the end.
    pub fn sort_columns(&mut self, declared: &[String]) {
        if declared.is_empty() {
            return;
        }
        let position = |name: &str| {
            declared
                .iter()
                .position(|d| d.eq_ignore_ascii_case(name))
                .unwrap_or(usize::MAX)
        };
        self.columns.sort_by(|a, _, b, _| position(a).cmp(&position(b)));
    }
}

/// Merge `candidate` into the first row of `rows` it is mergeable with.
///
/// Returns the index of the absorbing row, or `None` when the candidate is a
/// new record.
pub fn try_merge(candidate: &Row, rows: &mut [Row]) -> Option<usize> {
    let index = rows.iter().position(|r| r.is_mergeable_with(candidate))?;
    rows[index].merge_from(candidate);
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_columns_keeps_unknown_last() {
        let mut row = Row::new("t")
            .with("extra", 1)
            .with("b", 2)
            .with("a", 3);
        row.sort_columns(&["a".to_string(), "b".to_string()]);
        let names: Vec<_> = row.columns.keys().cloned().collect();
        assert_eq!(names, vec!["a", "b", "extra"]);
    }

    #[test]
    fn test_missing_columns_counts_nulls() {
        let row = Row::new("t").with("a", 1).with("b", Value::Null);
        let wanted = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(row.missing_columns(&wanted), vec!["b", "c"]);
    }
}
