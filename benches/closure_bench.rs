use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sql_fixtures::{ClosureBuilder, NoBackfill, Row, RowOrderer, SchemaMetadata};
use std::hint::black_box;

/// `depth` tables, each referencing the previous one
fn chain_ddl(depth: usize) -> String {
    let mut ddl = String::from("CREATE TABLE t0 (id INT PRIMARY KEY, label VARCHAR(20));\n");
    for i in 1..depth {
        ddl.push_str(&format!(
            "CREATE TABLE t{} (id INT PRIMARY KEY, parent_id INT REFERENCES t{}(id), label VARCHAR(20));\n",
            i,
            i - 1
        ));
    }
    ddl
}

/// `count` rows of the deepest table, pointing at `fan_in` distinct parents
fn leaf_rows(depth: usize, count: usize, fan_in: usize) -> Vec<Row> {
    let leaf = format!("t{}", depth - 1);
    (0..count)
        .map(|i| {
            Row::new(leaf.clone())
                .with("id", i as i64)
                .with("parent_id", (i % fan_in) as i64)
                .with("label", format!("row {}", i))
        })
        .collect()
}

fn bench_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure");

    for depth in [2, 8, 32] {
        let meta = SchemaMetadata::from_ddl(&chain_ddl(depth));
        let seeds = leaf_rows(depth, 500, 50);

        group.throughput(Throughput::Elements(seeds.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("chain", format!("{}_tables", depth)),
            &seeds,
            |b, seeds| {
                b.iter(|| {
                    let closed = ClosureBuilder::close(&meta, &NoBackfill, seeds.clone());
                    black_box(closed.rows.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordering");

    for count in [100, 1000, 5000] {
        let meta = SchemaMetadata::from_ddl(&chain_ddl(4));
        let closed = ClosureBuilder::close(&meta, &NoBackfill, leaf_rows(4, count, 10));

        group.throughput(Throughput::Elements(closed.rows.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("order", format!("{}_rows", count)),
            &closed.rows,
            |b, rows| {
                b.iter(|| black_box(RowOrderer::new(&meta).order(rows.clone())));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_closure, bench_ordering);
criterion_main!(benches);
