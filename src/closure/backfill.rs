//! Lookup of NOT NULL values a partial row is missing.

use crate::row::Row;
use anyhow::Result;

/// Fetches values for `missing` columns of the first stored row of `table`
/// that agrees with every column of `known`.
///
/// `Ok(None)` means no stored row matched.
pub trait BackfillQuery {
    fn find_missing(&self, table: &str, missing: &[String], known: &Row) -> Result<Option<Row>>;
}

/// Backfill that never finds anything, for offline closure over metadata only
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackfill;

impl BackfillQuery for NoBackfill {
    fn find_missing(&self, _table: &str, _missing: &[String], _known: &Row) -> Result<Option<Row>> {
        Ok(None)
    }
}
