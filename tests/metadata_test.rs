//! Metadata providers over a live DuckDB catalog.

use sql_fixtures::{CachedMetadata, Database, MetadataProvider};
use std::sync::Arc;

const LEAGUE_SQL: &str = "
    CREATE TABLE city (id INTEGER PRIMARY KEY, name VARCHAR);
    CREATE TABLE team (
        id INTEGER PRIMARY KEY,
        name VARCHAR NOT NULL,
        city_id INTEGER REFERENCES city(id)
    );
    CREATE TABLE player (
        id INTEGER PRIMARY KEY,
        name VARCHAR,
        team_id INTEGER NOT NULL REFERENCES team(id),
        joined DATE
    );
    CREATE TABLE Food (id BIGINT, Dishname VARCHAR, Allergy VARCHAR, Price DECIMAL(10, 2));";

fn league() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.execute_batch(LEAGUE_SQL).unwrap();
    db
}

#[test]
fn test_catalog_column_facts() {
    let db = league();
    let meta = db.metadata().unwrap();

    assert_eq!(
        meta.column_order("player").unwrap(),
        vec!["id", "name", "team_id", "joined"]
    );
    assert_eq!(meta.primary_key_columns("player").unwrap(), vec!["id"]);

    let mut not_null = meta.not_null_columns("player").unwrap();
    not_null.sort();
    assert_eq!(not_null, vec!["id", "team_id"]);

    assert!(meta.not_null_columns("Food").unwrap().is_empty());
    assert!(meta.column_order("missing_table").unwrap().is_empty());
}

#[test]
fn test_catalog_foreign_keys() {
    let db = league();
    let meta = db.metadata().unwrap();

    let fks = meta.foreign_keys("player").unwrap();
    assert_eq!(fks.len(), 1);
    let mapping = fks.find_mapping_for_column("TEAM_ID").unwrap();
    assert_eq!(mapping.target_table, "team");
    assert_eq!(mapping.target_column, "id");

    assert!(meta.foreign_keys("city").unwrap().is_empty());
}

#[test]
fn test_catalog_reachability_walks_foreign_keys() {
    let db = league();
    let meta = db.metadata().unwrap();

    let levels: Vec<(String, usize)> = meta
        .referenced_tables("player")
        .unwrap()
        .iter()
        .map(|r| (r.referenced_table.clone(), r.level))
        .collect();
    assert_eq!(
        levels,
        vec![("team".to_string(), 1), ("city".to_string(), 2)]
    );
    assert!(meta.reaches("player", "city"));
    assert!(!meta.reaches("city", "player"));
}

#[test]
fn test_table_names_take_catalog_spelling() {
    let db = league();
    let meta = db.metadata().unwrap();

    assert_eq!(meta.normalize_table_name("PLAYER"), "player");
    assert_eq!(meta.normalize_table_name("food"), "Food");
    assert_eq!(meta.normalize_table_name("\"Food\""), "Food");
    assert_eq!(meta.normalize_table_name("nowhere"), "nowhere");
}

#[test]
fn test_cached_catalog_is_shared_between_threads() {
    let db = league();
    let shared = Arc::new(CachedMetadata::new(db.metadata().unwrap()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let meta = Arc::clone(&shared);
            std::thread::spawn(move || {
                (
                    meta.column_order("team").unwrap(),
                    meta.reaches("player", "city"),
                )
            })
        })
        .collect();

    for handle in handles {
        let (columns, reaches) = handle.join().unwrap();
        assert_eq!(columns, vec!["id", "name", "city_id"]);
        assert!(reaches);
    }
}

#[test]
fn test_cache_keeps_first_answer() {
    let db = league();
    let cached = CachedMetadata::new(db.metadata().unwrap());
    let before = vec!["id", "Dishname", "Allergy", "Price"];
    assert_eq!(cached.column_order("Food").unwrap(), before);

    // Schema changes are not observed once a table has been looked up
    db.execute_batch("ALTER TABLE Food ADD COLUMN Origin VARCHAR")
        .unwrap();
    assert_eq!(cached.column_order("Food").unwrap(), before);
    assert_eq!(cached.inner().column_order("Food").unwrap().len(), 5);
}
