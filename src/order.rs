//! Insertion order for a closed row set.
//!
//! Tables are ranked into tiers with Kahn's algorithm over the "references"
//! relation restricted to the tables present, so every referenced table
//! lands in an earlier tier than the tables referencing it. Tables on a
//! foreign-key cycle are ranked together as one group. Within a tier,
//! rows of one table are ordered by primary key and tables by name. The sort
//! is stable: rows that compare equal keep their discovery order.

use crate::metadata::MetadataProvider;
use crate::row::Row;
use crate::value::Value;
use ahash::AHashMap;
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::warn;

/// Tier assignment for a set of tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableTiers {
    /// Lowercased table name to tier
    tiers: AHashMap<String, usize>,
    /// Tables on a foreign-key cycle. Members of one cycle share a tier.
    pub cyclic_tables: Vec<String>,
}

impl TableTiers {
    /// Rank `tables` so referenced tables come first.
    ///
    /// Tables that reach each other form one group; groups are then ranked
    /// with Kahn's algorithm, which always places every group because the
    /// grouped relation has no cycle left.
    pub fn compute(metadata: &dyn MetadataProvider, tables: &[String]) -> Self {
        let n = tables.len();
        let reach: Vec<Vec<bool>> = tables
            .iter()
            .enumerate()
            .map(|(a, from)| {
                tables
                    .iter()
                    .enumerate()
                    .map(|(b, to)| a != b && metadata.reaches(from, to))
                    .collect()
            })
            .collect();

        let mut group_of = vec![usize::MAX; n];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for a in 0..n {
            if group_of[a] != usize::MAX {
                continue;
            }
            let members: Vec<usize> = (0..n)
                .filter(|&b| b == a || (reach[a][b] && reach[b][a]))
                .collect();
            for &m in &members {
                group_of[m] = groups.len();
            }
            groups.push(members);
        }

        let g = groups.len();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); g];
        let mut in_degree = vec![0usize; g];
        for x in 0..g {
            for y in 0..g {
                let waits = x != y
                    && groups[x]
                        .iter()
                        .any(|&a| groups[y].iter().any(|&b| reach[a][b]));
                if waits {
                    // group `x` must wait for group `y`
                    dependents[y].push(x);
                    in_degree[x] += 1;
                }
            }
        }

        let mut group_tier = vec![0usize; g];
        let mut queue: VecDeque<usize> = (0..g).filter(|&x| in_degree[x] == 0).collect();
        while let Some(y) = queue.pop_front() {
            for &x in &dependents[y] {
                group_tier[x] = group_tier[x].max(group_tier[y] + 1);
                in_degree[x] -= 1;
                if in_degree[x] == 0 {
                    queue.push_back(x);
                }
            }
        }

        let mut cyclic_tables: Vec<String> = groups
            .iter()
            .filter(|members| members.len() > 1)
            .flatten()
            .map(|&i| tables[i].clone())
            .collect();
        cyclic_tables.sort();

        Self {
            tiers: tables
                .iter()
                .enumerate()
                .map(|(i, t)| (t.to_lowercase(), group_tier[group_of[i]]))
                .collect(),
            cyclic_tables,
        }
    }

    pub fn tier(&self, table: &str) -> usize {
        self.tiers.get(&table.to_lowercase()).copied().unwrap_or(0)
    }
}

/// Sorts closed rows into an order that satisfies foreign keys on insert.
pub struct RowOrderer<'a> {
    metadata: &'a dyn MetadataProvider,
}

impl<'a> RowOrderer<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider) -> Self {
        Self { metadata }
    }

    pub fn order(&self, mut rows: Vec<Row>) -> Vec<Row> {
        let mut tables: Vec<String> = Vec::new();
        for row in &rows {
            if !tables.iter().any(|t| t.eq_ignore_ascii_case(&row.table)) {
                tables.push(row.table.clone());
            }
        }

        let mut column_orders: AHashMap<String, Vec<String>> = AHashMap::new();
        let mut primary_keys: AHashMap<String, Vec<String>> = AHashMap::new();
        for table in &tables {
            let key = table.to_lowercase();
            let declared = self.lookup(table, "column order", |m, t| m.column_order(t));
            let pk = self.lookup(table, "primary key", |m, t| m.primary_key_columns(t));
            column_orders.insert(key.clone(), declared);
            primary_keys.insert(key, pk);
        }

        for row in &mut rows {
            if let Some(declared) = column_orders.get(&row.table.to_lowercase()) {
                row.sort_columns(declared);
            }
        }

        let tiers = TableTiers::compute(self.metadata, &tables);
        if !tiers.cyclic_tables.is_empty() {
            warn!(
                "Foreign-key cycle between {}: these rows may need deferred constraints",
                tiers.cyclic_tables.join(", ")
            );
        }

        rows.sort_by(|a, b| {
            tiers
                .tier(&a.table)
                .cmp(&tiers.tier(&b.table))
                .then_with(|| {
                    if a.table.eq_ignore_ascii_case(&b.table) {
                        let pk = primary_keys
                            .get(&a.table.to_lowercase())
                            .map(Vec::as_slice)
                            .unwrap_or_default();
                        compare_primary_keys(a, b, pk)
                    } else {
                        a.table.to_lowercase().cmp(&b.table.to_lowercase())
                    }
                })
        });

        rows
    }

    fn lookup<F>(&self, table: &str, what: &str, f: F) -> Vec<String>
    where
        F: FnOnce(&dyn MetadataProvider, &str) -> anyhow::Result<Vec<String>>,
    {
        f(self.metadata, table).unwrap_or_else(|e| {
            warn!(table, "Cannot read {what}, ordering without it: {e:#}");
            Vec::new()
        })
    }
}

/// Compare two rows of the same table by primary key.
///
/// All-integer keys compare numerically column by column in key order;
/// anything else compares the concatenated text of the key values, with
/// NULL as the empty string.
pub fn compare_primary_keys(a: &Row, b: &Row, pk: &[String]) -> Ordering {
    if pk.is_empty() {
        return Ordering::Equal;
    }

    let values = |row: &Row| -> Vec<Value> {
        pk.iter()
            .map(|c| row.get_ignore_case(c).cloned().unwrap_or(Value::Null))
            .collect()
    };
    let (left, right) = (values(a), values(b));

    let numeric: Option<Vec<Ordering>> = left
        .iter()
        .zip(&right)
        .map(|(l, r)| l.cmp_int(r))
        .collect();

    match numeric {
        Some(orderings) => orderings
            .into_iter()
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal),
        None => {
            let concat = |vs: &[Value]| vs.iter().map(Value::to_plain_string).collect::<String>();
            concat(&left).cmp(&concat(&right))
        }
    }
}
