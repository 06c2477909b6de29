//! Integration tests driving the `sql-fixtures` binary

use std::fs;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

const SHOP_SQL: &str = "
CREATE TABLE customer (id INTEGER PRIMARY KEY, name VARCHAR NOT NULL, email VARCHAR);
CREATE TABLE orders (
    id INTEGER PRIMARY KEY,
    customer_id INTEGER NOT NULL REFERENCES customer(id),
    total DECIMAL(8, 2)
);
INSERT INTO customer VALUES (1, 'Ann', 'ann@example.org'), (2, 'Bob', NULL);
INSERT INTO orders VALUES (100, 1, 12.50), (101, 2, 3.00), (102, 1, 7.25);
";

fn create_temp_sql(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".sql").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn sql_fixtures_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sql-fixtures"))
}

#[test]
fn test_generate_script_to_stdout() {
    let init = create_temp_sql(SHOP_SQL);

    let output = sql_fixtures_bin()
        .arg("generate")
        .arg("--init")
        .arg(init.path())
        .arg("SELECT * FROM orders WHERE id = 101")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "INSERT INTO customer(id, name) VALUES(2, 'Bob');\n\
         INSERT INTO orders(id, customer_id, total) VALUES(101, 2, 3.00);\n"
    );
}

#[test]
fn test_generate_json_with_param() {
    let init = create_temp_sql(SHOP_SQL);

    let output = sql_fixtures_bin()
        .args(["generate", "--format", "json", "--param", "1"])
        .arg("--init")
        .arg(init.path())
        .arg("SELECT id FROM customer WHERE id = ?")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("Failed to parse JSON ({e}): {stdout}"));

    assert_eq!(json["dialect"], "duckdb");
    assert_eq!(
        json["statements"][0],
        "INSERT INTO customer(id, name) VALUES(1, 'Ann')"
    );
    assert_eq!(json["rows"][0]["table"], "customer");
    assert_eq!(json["rows"][0]["columns"]["name"], "Ann");
    assert_eq!(json["stats"]["backfill_queries"], 1);
}

#[test]
fn test_query_file_and_output_file() {
    let init = create_temp_sql(SHOP_SQL);
    let queries = create_temp_sql(
        "-- orders of Ann\nDELETE FROM orders WHERE customer_id = 1;\nINSERT INTO orders VALUES (9, 1, 1);",
    );
    let out_dir = TempDir::new().unwrap();
    let out_file = out_dir.path().join("fixtures.sql");

    let output = sql_fixtures_bin()
        .arg("generate")
        .arg("--init")
        .arg(init.path())
        .arg("--query-file")
        .arg(queries.path())
        .arg("-o")
        .arg(&out_file)
        .arg("--dialect")
        .arg("postgres")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let written = fs::read_to_string(&out_file).unwrap();
    assert_eq!(
        written,
        "INSERT INTO customer(id, name) VALUES(1, 'Ann');\n\
         INSERT INTO orders(id, customer_id, total) VALUES(100, 1, 12.50);\n\
         INSERT INTO orders(id, customer_id, total) VALUES(102, 1, 7.25);\n"
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("Wrote 3 INSERT statement(s)"));
}

#[test]
fn test_config_file_supplies_defaults() {
    let init = create_temp_sql(SHOP_SQL);
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("fixtures.yaml");
    fs::write(
        &config,
        format!(
            "format: list\ndialect: sqlserver\ninit:\n  - {}\n",
            init.path().display()
        ),
    )
    .unwrap();

    let output = sql_fixtures_bin()
        .arg("generate")
        .arg("--config")
        .arg(&config)
        .arg("SELECT name FROM customer WHERE id = 1")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "INSERT INTO customer(id, name) VALUES(1, 'Ann')\n"
    );
}

#[test]
fn test_param_needs_single_statement() {
    let output = sql_fixtures_bin()
        .args(["generate", "--param", "1", "SELECT 1", "SELECT 2"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("exactly one statement"));
}

#[test]
fn test_unknown_dialect_is_rejected() {
    let output = sql_fixtures_bin()
        .args(["generate", "--dialect", "db2", "SELECT 1"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_completions() {
    let output = sql_fixtures_bin()
        .args(["completions", "bash"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("sql-fixtures"));
}
