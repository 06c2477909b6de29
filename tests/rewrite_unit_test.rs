//! Unit tests for statement rewriting and statement splitting.

use sql_fixtures::sql::{split_statements, statement_kind, to_select, StatementKind};

#[test]
fn test_select_passes_through() {
    assert_eq!(
        to_select("SELECT * FROM player WHERE id = ?;").as_deref(),
        Some("SELECT * FROM player WHERE id = ?")
    );
    assert_eq!(
        to_select("  -- recent ones\nWITH r AS (SELECT 1) SELECT * FROM r").as_deref(),
        Some("WITH r AS (SELECT 1) SELECT * FROM r")
    );
}

#[test]
fn test_delete_reads_whole_rows() {
    assert_eq!(
        to_select("DELETE FROM Food").as_deref(),
        Some("SELECT * FROM Food")
    );
    assert_eq!(
        to_select("DELETE FROM Food f WHERE f.Price > 10 RETURNING id").as_deref(),
        Some("SELECT * FROM Food f WHERE f.Price > 10")
    );
    assert_eq!(
        to_select("delete from main.Food where id = $1").as_deref(),
        Some("SELECT * FROM main.Food where id = $1")
    );
}

#[test]
fn test_delete_using_is_not_rewritten() {
    assert_eq!(to_select("DELETE FROM a USING b WHERE a.id = b.id"), None);
}

#[test]
fn test_update_reads_assigned_and_filtered_columns() {
    assert_eq!(
        to_select("UPDATE Food SET Price = 7.00, Allergy='none'").as_deref(),
        Some("SELECT Price, Allergy FROM Food")
    );
    assert_eq!(
        to_select(
            "UPDATE Food SET Price = 7.00 WHERE Allergy LIKE 'past%' OR Allergy = 'cheese' OR Dishname = 'Pizza'"
        )
        .as_deref(),
        Some(
            "SELECT Price, Allergy, Dishname FROM Food WHERE Allergy LIKE 'past%' OR Allergy = 'cheese' OR Dishname = 'Pizza'"
        )
    );
}

#[test]
fn test_update_with_swapped_operands_and_alias() {
    assert_eq!(
        to_select("UPDATE Food AS f SET f.Price = 7 WHERE 'Pizza' = f.Dishname").as_deref(),
        Some("SELECT Price, Dishname FROM Food AS f WHERE 'Pizza' = f.Dishname")
    );
}

#[test]
fn test_update_from_is_not_rewritten() {
    assert_eq!(
        to_select("UPDATE a SET x = b.x FROM b WHERE a.id = b.id"),
        None
    );
}

#[test]
fn test_other_statements_yield_nothing() {
    assert_eq!(to_select("INSERT INTO t VALUES (1)"), None);
    assert_eq!(to_select("CREATE TABLE t (id INT)"), None);
    assert_eq!(to_select(""), None);
    assert_eq!(statement_kind("MERGE INTO t USING s ON 1=1"), StatementKind::Other);
    assert_eq!(statement_kind("update t set a = 1"), StatementKind::Update);
}

#[test]
fn test_split_statements_respects_quotes_and_comments() {
    let script = "INSERT INTO t VALUES ('a;b'); -- trailing; comment\n\
                  SELECT 1;;\n/* block; */ SELECT 2";
    assert_eq!(
        split_statements(script),
        vec![
            "INSERT INTO t VALUES ('a;b')",
            "-- trailing; comment\nSELECT 1",
            "/* block; */ SELECT 2",
        ]
    );
}
