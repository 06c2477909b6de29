//! Read-through memoization of metadata lookups.

use super::{ColumnsMappingGroup, MetadataProvider, ReferencedTableSet};
use ahash::AHashMap;
use anyhow::Result;
use std::sync::{PoisonError, RwLock};
use tracing::warn;

/// Memoizes every lookup of the wrapped provider, keyed by table name.
///
/// Entries are never evicted or invalidated: the wrapper assumes the schema
/// does not change while it is alive. A failed lookup is logged and cached as
/// an empty result, so a broken catalog query is attempted once per table.
///
/// Safe to share between threads; concurrent misses on the same key may both
/// reach the inner provider, and the first stored answer wins.
pub struct CachedMetadata<P> {
    inner: P,
    not_null: RwLock<AHashMap<String, Vec<String>>>,
    column_order: RwLock<AHashMap<String, Vec<String>>>,
    foreign_keys: RwLock<AHashMap<String, ColumnsMappingGroup>>,
    primary_keys: RwLock<AHashMap<String, Vec<String>>>,
    referenced: RwLock<AHashMap<String, ReferencedTableSet>>,
    normalized: RwLock<AHashMap<String, String>>,
}

impl<P: MetadataProvider> CachedMetadata<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            not_null: RwLock::default(),
            column_order: RwLock::default(),
            foreign_keys: RwLock::default(),
            primary_keys: RwLock::default(),
            referenced: RwLock::default(),
            normalized: RwLock::default(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

fn memoize<T, F>(map: &RwLock<AHashMap<String, T>>, key: &str, what: &str, load: F) -> T
where
    T: Clone + Default,
    F: FnOnce() -> Result<T>,
{
    if let Some(hit) = map
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
    {
        return hit.clone();
    }

    let value = load().unwrap_or_else(|e| {
        warn!(table = key, "{what} lookup failed, assuming none: {e:#}");
        T::default()
    });

    map.write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(key.to_string())
        .or_insert(value)
        .clone()
}

impl<P: MetadataProvider> MetadataProvider for CachedMetadata<P> {
    fn not_null_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(memoize(&self.not_null, table, "not-null column", || {
            self.inner.not_null_columns(table)
        }))
    }

    fn column_order(&self, table: &str) -> Result<Vec<String>> {
        Ok(memoize(&self.column_order, table, "column order", || {
            self.inner.column_order(table)
        }))
    }

    fn foreign_keys(&self, table: &str) -> Result<ColumnsMappingGroup> {
        Ok(memoize(&self.foreign_keys, table, "foreign key", || {
            self.inner.foreign_keys(table)
        }))
    }

    fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(memoize(&self.primary_keys, table, "primary key", || {
            self.inner.primary_key_columns(table)
        }))
    }

    fn referenced_tables(&self, table: &str) -> Result<ReferencedTableSet> {
        Ok(memoize(&self.referenced, table, "referenced table", || {
            self.inner.referenced_tables(table)
        }))
    }

    fn normalize_table_name(&self, table: &str) -> String {
        memoize(&self.normalized, table, "table name", || {
            Ok(self.inner.normalize_table_name(table))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl MetadataProvider for Counting {
        fn not_null_columns(&self, _table: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["id".to_string()])
        }

        fn column_order(&self, _table: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            bail!("catalog unavailable")
        }

        fn foreign_keys(&self, _table: &str) -> Result<ColumnsMappingGroup> {
            Ok(ColumnsMappingGroup::default())
        }

        fn primary_key_columns(&self, _table: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn normalize_table_name(&self, table: &str) -> String {
            table.to_string()
        }
    }

    #[test]
    fn test_hits_do_not_reach_inner_provider() {
        let cached = CachedMetadata::new(Counting::default());
        assert_eq!(cached.not_null_columns("t").unwrap(), vec!["id"]);
        assert_eq!(cached.not_null_columns("t").unwrap(), vec!["id"]);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_cached_as_empty() {
        let cached = CachedMetadata::new(Counting::default());
        assert!(cached.column_order("t").unwrap().is_empty());
        assert!(cached.column_order("t").unwrap().is_empty());
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
    }
}
