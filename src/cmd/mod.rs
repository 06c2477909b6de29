mod generate;
mod glob_util;
mod repl;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sql_fixtures::{Database, Dialect, FixtureGenerator, SchemaMetadata};
use std::io;
use std::path::Path;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sql-fixtures")]
#[command(version)]
#[command(
    about = "Generate the INSERT statements that recreate the rows a SQL statement touches",
    long_about = None
)]
pub struct Cli {
    /// Log debug diagnostics to stderr (see also SQL_FIXTURES_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate INSERT statements for SELECT, UPDATE or DELETE statements
    Generate(generate::GenerateArgs),

    /// Interactive session: type a statement, get its INSERT statements
    Repl(repl::ReplArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => generate::run(args),
        Commands::Repl(args) => repl::run(args),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "sql-fixtures",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}

fn parse_dialect(value: &str) -> anyhow::Result<Dialect> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

/// Open the database (in-memory without a path) and run the init scripts
fn open_database(path: Option<&Path>, init: &[String]) -> anyhow::Result<Database> {
    let database = match path {
        Some(path) => Database::open(path)?,
        None => Database::open_in_memory()?,
    };

    for script in glob_util::expand_scripts(init)? {
        tracing::debug!(script = %script.display(), "running init script");
        database.run_script(&script)?;
    }
    Ok(database)
}

/// Generator over `database`, reading metadata from a DDL file when given
/// and from the database catalog otherwise
fn build_generator(
    database: Database,
    schema: Option<&Path>,
    dialect: Dialect,
) -> anyhow::Result<FixtureGenerator> {
    let generator = match schema {
        Some(path) => {
            let ddl = sql_fixtures::database::read_script(path)
                .with_context(|| format!("Failed to read schema: {}", path.display()))?;
            let metadata = SchemaMetadata::from_ddl_with_dialect(&ddl, dialect);
            FixtureGenerator::with_metadata(database, Arc::new(metadata))
        }
        None => FixtureGenerator::new(database)?,
    };
    Ok(generator.with_dialect(dialect))
}
