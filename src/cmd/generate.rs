//! `generate`: statements in, INSERT statements out.

use super::{build_generator, open_database, parse_dialect};
use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use sql_fixtures::config::{FixtureConfig, OutputFormat};
use sql_fixtures::database::read_script;
use sql_fixtures::sql::split_statements;
use sql_fixtures::{InsertRenderer, SqlQuery, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(after_help = "Examples:
  sql-fixtures generate --db app.duckdb \"SELECT * FROM orders WHERE id = 42\"
  sql-fixtures generate --init schema.sql --init data.sql.gz \"DELETE FROM player WHERE id = 3\"
  sql-fixtures generate --db app.duckdb \"SELECT * FROM orders WHERE id = ?\" --param 42 -f json
  sql-fixtures generate --config fixtures.yaml --query-file statements.sql -o fixtures.sql")]
pub struct GenerateArgs {
    /// Statements to generate fixtures for
    #[arg(value_name = "STATEMENT")]
    pub statements: Vec<String>,

    /// File of `;`-separated statements (repeatable)
    #[arg(short = 'q', long, value_name = "FILE")]
    pub query_file: Vec<PathBuf>,

    /// Bind parameter for a single statement, in order (repeatable)
    #[arg(long, value_name = "VALUE")]
    pub param: Vec<String>,

    /// DuckDB database file (in-memory when omitted)
    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Script or glob pattern run before generating (repeatable; .gz, .bz2, .xz, .zst accepted)
    #[arg(long, value_name = "PATTERN")]
    pub init: Vec<String>,

    /// Read table metadata from this DDL file instead of the database catalog
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Dialect of the generated literals: duckdb, postgres, mysql, mariadb, h2, hsqldb, sqlserver, oracle, other
    #[arg(short, long)]
    pub dialect: Option<String>,

    /// Output format: script, list, json
    #[arg(short, long)]
    pub format: Option<String>,

    /// Write output to file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Longest foreign-key chain followed from a seed row
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print closure statistics to stderr
    #[arg(long)]
    pub stats: bool,

    /// Show a progress spinner
    #[arg(short, long)]
    pub progress: bool,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => FixtureConfig::load(path)?,
        None => FixtureConfig::default(),
    };

    let dialect = match &args.dialect {
        Some(d) => parse_dialect(d)?,
        None => config.dialect(),
    };
    let format: OutputFormat = match &args.format {
        Some(f) => f.parse().map_err(|e: String| anyhow::anyhow!(e))?,
        None => config.format(),
    };
    let max_depth = args.max_depth.unwrap_or_else(|| config.max_depth());

    let queries = collect_queries(&args)?;
    if queries.is_empty() {
        bail!("No statements given (pass them as arguments or with --query-file)");
    }

    let pb = if args.progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Loading database...");
        Some(pb)
    } else {
        None
    };

    let mut init = config.init.clone();
    init.extend(args.init.iter().cloned());
    let database = open_database(args.db.as_deref().or(config.database.as_deref()), &init)?;

    let generator =
        build_generator(database, args.schema.as_deref(), dialect)?.with_max_depth(max_depth);

    if let Some(ref pb) = pb {
        pb.set_message(format!("Generating fixtures for {} statement(s)...", queries.len()));
    }
    let generated = generator.generate_rows(&queries)?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let renderer = InsertRenderer::new(dialect);
    let output = match format {
        OutputFormat::Script => renderer.render_script(&generated.rows),
        OutputFormat::List => renderer
            .render_list(&generated.rows)
            .into_iter()
            .map(|statement| statement + "\n")
            .collect(),
        OutputFormat::Json => {
            let document = json!({
                "dialect": dialect.to_string(),
                "statements": renderer.render_list(&generated.rows),
                "rows": generated.rows,
                "stats": generated.stats,
            });
            serde_json::to_string_pretty(&document)? + "\n"
        }
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writer.write_all(output.as_bytes())?;
            writer.flush()?;
            eprintln!(
                "Wrote {} INSERT statement(s) to {}",
                generated.rows.len(),
                path.display()
            );
        }
        None => print!("{}", output),
    }

    if args.stats {
        eprintln!("{}", generated.stats);
        for warning in &generated.stats.warnings {
            eprintln!("Warning: {}", warning);
        }
    }

    Ok(())
}

fn collect_queries(args: &GenerateArgs) -> Result<Vec<SqlQuery>> {
    let mut statements: Vec<String> = args.statements.clone();
    for path in &args.query_file {
        let script = read_script(path)?;
        statements.extend(split_statements(&script));
    }

    if args.param.is_empty() {
        return Ok(statements.into_iter().map(SqlQuery::from).collect());
    }
    if statements.len() != 1 {
        bail!(
            "--param needs exactly one statement, got {}",
            statements.len()
        );
    }
    let params = args.param.iter().map(|p| parse_param(p)).collect();
    Ok(vec![SqlQuery::with_params(statements.remove(0), params)])
}

/// `null`, booleans and numbers are typed; anything else binds as text
fn parse_param(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("null") {
        Value::Null
    } else if let Ok(b) = raw.parse::<bool>() {
        Value::Bool(b)
    } else if let Ok(n) = raw.parse::<i64>() {
        Value::Int(n)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::Text(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("NULL"), Value::Null);
        assert_eq!(parse_param("true"), Value::Bool(true));
        assert_eq!(parse_param("42"), Value::Int(42));
        assert_eq!(parse_param("4.5"), Value::Float(4.5));
        assert_eq!(parse_param("abc"), Value::Text("abc".into()));
    }
}
