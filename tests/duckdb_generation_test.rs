//! End-to-end fixture generation against in-memory DuckDB databases.

use sql_fixtures::{
    CachedMetadata, Database, Dialect, FixtureGenerator, MetadataProvider, Row, SqlQuery, Value,
};
use std::sync::Arc;

const LEAGUE_DDL: &str = "
    CREATE TABLE city (id INTEGER PRIMARY KEY, name VARCHAR);
    CREATE TABLE team (
        id INTEGER PRIMARY KEY,
        name VARCHAR NOT NULL,
        city_id INTEGER REFERENCES city(id)
    );
    CREATE TABLE player (
        id INTEGER PRIMARY KEY,
        name VARCHAR,
        team_id INTEGER NOT NULL REFERENCES team(id)
    );";

const LEAGUE_DATA: &str = "
    INSERT INTO city VALUES (1, 'Lyon');
    INSERT INTO team VALUES (10, 'Reds', 1), (20, 'Blues', NULL);
    INSERT INTO player VALUES (1, 'Ann', 10), (2, 'Bob', 20);";

fn database(sql: &str) -> Database {
    let db = Database::open_in_memory().unwrap();
    db.execute_batch(sql).unwrap();
    db
}

fn league() -> FixtureGenerator {
    let db = database(&format!("{LEAGUE_DDL}{LEAGUE_DATA}"));
    FixtureGenerator::new(db).unwrap()
}

fn script(generator: &FixtureGenerator, queries: &[&str]) -> String {
    let queries: Vec<SqlQuery> = queries.iter().map(|q| SqlQuery::new(*q)).collect();
    generator.generate_insert_script(&queries).unwrap()
}

#[test]
fn test_single_table_row_uses_declared_column_order() {
    let db = database(
        "CREATE TABLE note (id INTEGER, body VARCHAR, stars INTEGER);
         INSERT INTO note VALUES (1, 'first', 5);",
    );
    let generator = FixtureGenerator::new(db).unwrap();

    assert_eq!(
        script(&generator, &["SELECT stars, body, id FROM note"]),
        "INSERT INTO note(id, body, stars) VALUES(1, 'first', 5);\n"
    );
}

#[test]
fn test_missing_parent_row_is_inserted_first() {
    let generator = league();

    assert_eq!(
        script(&generator, &["SELECT * FROM player WHERE id = 2"]),
        "INSERT INTO team(id, name) VALUES(20, 'Blues');\n\
         INSERT INTO player(id, name, team_id) VALUES(2, 'Bob', 20);\n"
    );
}

#[test]
fn test_merged_row_pulls_in_its_references() {
    let generator = league();
    let generated = generator
        .generate_rows(&[
            SqlQuery::new("SELECT * FROM player WHERE id = 1"),
            SqlQuery::new("SELECT * FROM team WHERE id = 10"),
        ])
        .unwrap();

    // The team row first comes from the player's key, the full row later
    // merges into it and brings city_id along
    let tables: Vec<&str> = generated.rows.iter().map(|r| r.table.as_str()).collect();
    assert_eq!(tables, vec!["city", "team", "player"]);
    assert_eq!(generated.stats.backfill_queries, 1);
    assert_eq!(generated.stats.rows_merged, 1);
    assert_eq!(
        generated.rows[1],
        Row::new("team")
            .with("id", 10)
            .with("name", "Reds")
            .with("city_id", 1)
    );
}

#[test]
fn test_two_queries_on_one_record_give_one_insert() {
    let db = database(
        "CREATE TABLE customer (id INTEGER PRIMARY KEY, name VARCHAR, email VARCHAR, city VARCHAR);
         INSERT INTO customer VALUES (1, 'Ann', 'ann@example.org', 'Lyon');",
    );
    let generator = FixtureGenerator::new(db).unwrap();

    assert_eq!(
        script(
            &generator,
            &[
                "SELECT id, name FROM customer WHERE id = 1",
                "SELECT id, email FROM customer WHERE id = 1",
            ]
        ),
        "INSERT INTO customer(id, name, email) VALUES(1, 'Ann', 'ann@example.org');\n"
    );
}

#[test]
fn test_rows_follow_primary_key_order() {
    let db = database(
        "CREATE TABLE item (id INTEGER PRIMARY KEY);
         INSERT INTO item VALUES (30), (4), (12);",
    );
    let generator = FixtureGenerator::new(db).unwrap();

    assert_eq!(
        generator
            .generate_insert_list(&[SqlQuery::new("SELECT id FROM item")])
            .unwrap(),
        vec![
            "INSERT INTO item(id) VALUES(4)",
            "INSERT INTO item(id) VALUES(12)",
            "INSERT INTO item(id) VALUES(30)",
        ]
    );
}

#[test]
fn test_delete_without_where_recreates_every_row() {
    let db = database(
        "CREATE TABLE note (body VARCHAR, stars INTEGER);
         INSERT INTO note VALUES ('a', 1), ('b', NULL);",
    );
    let generator = FixtureGenerator::new(db).unwrap();

    assert_eq!(
        script(&generator, &["DELETE FROM note"]),
        "INSERT INTO note(body, stars) VALUES('a', 1);\n\
         INSERT INTO note(body, stars) VALUES('b', NULL);\n"
    );
}

#[test]
fn test_update_reads_rows_matching_its_filter() {
    let db = database(
        "CREATE TABLE Food (id BIGINT, Dishname VARCHAR, Allergy VARCHAR, Price DECIMAL(10, 2));
         INSERT INTO Food VALUES (1, 'Spaghetti Bolognese', 'cheese', 6.80);
         INSERT INTO Food VALUES (2, 'Pizza', 'pasta', 10.99);
         INSERT INTO Food VALUES (3, 'Salad', 'nuts', 4.50);",
    );
    let generator = FixtureGenerator::new(db).unwrap();

    let statements = generator
        .generate_insert_list(&[SqlQuery::new(
            "UPDATE Food SET Price = 7.00 WHERE Allergy LIKE 'past%' OR Allergy = 'cheese' OR Dishname = 'Pizza'",
        )])
        .unwrap();

    assert_eq!(
        statements,
        vec![
            "INSERT INTO Food(Dishname, Allergy, Price) VALUES('Spaghetti Bolognese', 'cheese', 6.80)",
            "INSERT INTO Food(Dishname, Allergy, Price) VALUES('Pizza', 'pasta', 10.99)",
        ]
    );
}

#[test]
fn test_non_reading_statements_produce_nothing() {
    let generator = league();
    assert_eq!(
        script(
            &generator,
            &["INSERT INTO city VALUES (2, 'Metz')", "CREATE TABLE x (id INT)"]
        ),
        ""
    );
}

#[test]
fn test_bind_parameters_reach_the_seed_query() {
    let generator = league();
    let list = generator
        .generate_insert_list(&[SqlQuery::with_params(
            "SELECT id, name FROM city WHERE name = ?",
            vec![Value::from("Lyon")],
        )])
        .unwrap();
    assert_eq!(list, vec!["INSERT INTO city(id, name) VALUES(1, 'Lyon')"]);
}

#[test]
fn test_hand_built_row_is_completed() {
    let generator = league();
    let list = generator
        .generate_insert_list_for_row(&Row::new("player").with("id", 2))
        .unwrap();

    assert_eq!(
        list,
        vec![
            "INSERT INTO team(id, name) VALUES(20, 'Blues')",
            "INSERT INTO player(id, team_id) VALUES(2, 20)",
        ]
    );
}

#[test]
fn test_join_attributes_columns_to_both_tables() {
    let generator = league();
    let generated = generator
        .generate_rows(&[SqlQuery::new(
            "SELECT p.name, t.name FROM player p JOIN team t ON p.team_id = t.id WHERE p.id = 2",
        )])
        .unwrap();

    let tables: Vec<&str> = generated.rows.iter().map(|r| r.table.as_str()).collect();
    assert_eq!(tables, vec!["team", "player"]);
    assert_eq!(generated.rows[1].get("name"), Some(&Value::from("Bob")));
    assert_eq!(generated.rows[1].get("team_id"), Some(&Value::Int(20)));
}

#[test]
fn test_dialect_changes_literals_only() {
    let db = database(
        "CREATE TABLE flag (id INTEGER PRIMARY KEY, on_duty BOOLEAN, since TIMESTAMP);
         INSERT INTO flag VALUES (1, true, TIMESTAMP '2012-09-17 19:56:47');",
    );
    let generator = FixtureGenerator::new(db)
        .unwrap()
        .with_dialect(Dialect::Oracle);

    assert_eq!(
        script(&generator, &["SELECT * FROM flag"]),
        "INSERT INTO flag(id, on_duty, since) VALUES(1, 1, \
         TO_DATE('2012-09-17-19-56-47', 'yyyy-mm-dd-HH24-mi-ss'));\n"
    );
}

#[test]
fn test_script_round_trips_into_fresh_schema() {
    let generator = league();
    let seed = SqlQuery::new(
        "SELECT p.id, p.name, t.name AS team FROM player p JOIN team t ON p.team_id = t.id ORDER BY p.id",
    );
    let generated = generator.generate_insert_script(&[seed.clone()]).unwrap();

    let fresh = database(LEAGUE_DDL);
    fresh.execute_batch(&generated).unwrap();

    let original = generator.database().query(&seed).unwrap();
    let replayed = fresh.query(&seed).unwrap();
    assert_eq!(replayed, original);
    assert_eq!(replayed.row_count(), 2);
}

#[test]
fn test_generators_share_metadata_across_threads() {
    let db = database(&format!("{LEAGUE_DDL}{LEAGUE_DATA}"));
    let metadata: Arc<dyn MetadataProvider> =
        Arc::new(CachedMetadata::new(db.metadata().unwrap()));

    let handles: Vec<_> = [1, 2]
        .into_iter()
        .map(|id| {
            let generator = FixtureGenerator::with_metadata(
                db.try_clone().unwrap(),
                Arc::clone(&metadata),
            );
            std::thread::spawn(move || {
                generator
                    .generate_rows(&[SqlQuery::with_params(
                        "SELECT * FROM player WHERE id = ?",
                        vec![Value::Int(id)],
                    )])
                    .unwrap()
                    .rows
                    .len()
            })
        })
        .collect();

    let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(counts, vec![2, 2]);
}

#[test]
fn test_zoned_interval_and_list_values_replay() {
    const SHIFT_DDL: &str = "CREATE TABLE shift (
        id INTEGER PRIMARY KEY,
        starts TIMETZ,
        duration INTERVAL,
        crew INTEGER[]
    );";
    let db = database(&format!(
        "{SHIFT_DDL} INSERT INTO shift VALUES (1, '10:00:00+02', INTERVAL 3 DAY, [4, 5]);"
    ));
    let generator = FixtureGenerator::new(db).unwrap();
    let seed = SqlQuery::new("SELECT * FROM shift");

    let generated = generator.generate_insert_script(&[seed.clone()]).unwrap();
    assert!(generated.contains("'10:00:00+02'"), "{generated}");
    assert!(generated.contains("'3 days'"), "{generated}");
    assert!(!generated.contains("Interval {"), "{generated}");

    let fresh = database(SHIFT_DDL);
    fresh.execute_batch(&generated).unwrap();
    assert_eq!(
        fresh.query(&seed).unwrap(),
        generator.database().query(&seed).unwrap()
    );
}
