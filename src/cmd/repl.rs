//! `repl`: an interactive session over one database.

use super::{build_generator, open_database, parse_dialect};
use anyhow::Result;
use clap::Args;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use sql_fixtures::{Dialect, FixtureGenerator, InsertRenderer, SqlQuery};
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(after_help = "Examples:
  sql-fixtures repl --db app.duckdb
  sql-fixtures repl --init schema.sql --init data.sql --dialect postgres")]
pub struct ReplArgs {
    /// DuckDB database file (in-memory when omitted)
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Script or glob pattern run at startup (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub init: Vec<String>,

    /// Read table metadata from this DDL file instead of the database catalog
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Dialect of the generated literals
    #[arg(short, long, default_value = "duckdb")]
    pub dialect: String,
}

pub fn run(args: ReplArgs) -> Result<()> {
    let dialect = parse_dialect(&args.dialect)?;
    let database = open_database(args.db.as_deref(), &args.init)?;
    let generator = build_generator(database, args.schema.as_deref(), dialect)?;

    let mut rl = DefaultEditor::new()?;
    let history_path = dirs::cache_dir()
        .map(|d| d.join("sql-fixtures").join("repl_history"))
        .unwrap_or_else(|| PathBuf::from(".sql_fixtures_history"));
    let _ = rl.load_history(&history_path);

    println!("sql-fixtures REPL");
    println!("Type a SELECT, UPDATE or DELETE statement, .help for commands, .exit to quit");
    println!();

    let mut dialect = generator.dialect();

    loop {
        match rl.readline("fixtures> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if trimmed.starts_with('.') {
                    if handle_meta_command(trimmed, &generator, &mut dialect)? {
                        break;
                    }
                    continue;
                }

                match generator.generate_rows(&[SqlQuery::new(trimmed)]) {
                    Ok(generated) => {
                        print!("{}", InsertRenderer::new(dialect).render_script(&generated.rows));
                        eprintln!("({})", generated.stats);
                    }
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}

/// Returns true when the session should end
fn handle_meta_command(
    command: &str,
    generator: &FixtureGenerator,
    dialect: &mut Dialect,
) -> Result<bool> {
    let parts: Vec<&str> = command.split_whitespace().collect();
    let cmd = parts.first().copied().unwrap_or("");

    match cmd {
        ".exit" | ".quit" | ".q" => {
            println!("Goodbye!");
            return Ok(true);
        }
        ".help" | ".h" | ".?" => {
            println!("Available commands:");
            println!("  .tables              List all tables");
            println!("  .dialect [name]      Show or set the output dialect");
            println!("  .exec <sql>          Execute a statement without generating fixtures");
            println!("  .exit, .quit, .q     Exit the REPL");
            println!();
        }
        ".tables" => {
            for table in generator.database().list_tables()? {
                println!("  {}", table);
            }
        }
        ".dialect" => match parts.get(1) {
            Some(name) => match parse_dialect(name) {
                Ok(d) => {
                    *dialect = d;
                    println!("Dialect set to {}", d);
                }
                Err(e) => eprintln!("{}", e),
            },
            None => println!("{}", dialect),
        },
        ".exec" => {
            let sql = command[cmd.len()..].trim();
            if sql.is_empty() {
                eprintln!("Usage: .exec <sql>");
            } else if let Err(e) = generator.database().execute_batch(sql) {
                eprintln!("Error: {:#}", e);
            }
        }
        _ => {
            eprintln!("Unknown command: {}. Type .help for available commands.", cmd);
        }
    }

    Ok(false)
}
