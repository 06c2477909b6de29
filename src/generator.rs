//! High-level entry point: from SQL statements to INSERT statements.

use crate::closure::{ClosedRows, ClosureBuilder, ClosureStats, DEFAULT_MAX_DEPTH};
use crate::database::Database;
use crate::dialect::Dialect;
use crate::metadata::{CachedMetadata, MetadataProvider};
use crate::order::RowOrderer;
use crate::query::SqlQuery;
use crate::render::InsertRenderer;
use crate::row::Row;
use crate::source::RowSource;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

/// Ordered fixture rows plus the statistics of the closure that produced them
#[derive(Debug, Clone, Default)]
pub struct GeneratedRows {
    pub rows: Vec<Row>,
    pub stats: ClosureStats,
}

/// Generates the INSERT statements recreating the rows that a list of
/// statements reads or modifies, plus every row those need to satisfy
/// foreign keys and NOT NULL constraints.
///
/// ```no_run
/// use sql_fixtures::{Database, FixtureGenerator, SqlQuery};
///
/// let db = Database::open_in_memory()?;
/// db.execute_batch("CREATE TABLE t (id INT PRIMARY KEY); INSERT INTO t VALUES (1);")?;
/// let generator = FixtureGenerator::new(db)?;
/// let script = generator.generate_insert_script(&[SqlQuery::new("SELECT * FROM t")])?;
/// assert_eq!(script, "INSERT INTO t(id) VALUES(1);\n");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct FixtureGenerator {
    database: Database,
    metadata: Arc<dyn MetadataProvider>,
    dialect: Dialect,
    max_depth: usize,
}

impl FixtureGenerator {
    /// Generator reading metadata from the database's own catalog, cached
    pub fn new(database: Database) -> Result<Self> {
        let catalog = database
            .metadata()
            .context("Failed to open catalog connection")?;
        Ok(Self::with_metadata(
            database,
            Arc::new(CachedMetadata::new(catalog)),
        ))
    }

    /// Generator using an explicit provider, which may be shared between
    /// generators running in parallel
    pub fn with_metadata(database: Database, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            database,
            metadata,
            dialect: Dialect::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Dialect the generated literals are written in
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataProvider> {
        &self.metadata
    }

    /// Closed and ordered rows for `queries`
    pub fn generate_rows(&self, queries: &[SqlQuery]) -> Result<GeneratedRows> {
        let source = RowSource::new(&self.database, self.metadata.as_ref());
        let mut builder = ClosureBuilder::new(self.metadata.as_ref(), &self.database)
            .with_max_depth(self.max_depth);

        for query in queries {
            let seeds = source
                .rows_for(query)
                .with_context(|| format!("Failed to read rows of: {}", query.sql))?;
            debug!(sql = %query.sql, seeds = seeds.len(), "seed rows read");
            builder.add_all(seeds);
        }

        Ok(self.ordered(builder.finish()))
    }

    /// Closed and ordered rows for one hand-built row
    pub fn generate_rows_for_row(&self, row: &Row) -> Result<GeneratedRows> {
        self.generate_rows(&[SqlQuery::from_row(row)])
    }

    /// INSERT statements joined into one script, each ending with `;`
    pub fn generate_insert_script(&self, queries: &[SqlQuery]) -> Result<String> {
        let generated = self.generate_rows(queries)?;
        Ok(self.renderer().render_script(&generated.rows))
    }

    /// INSERT statements without terminators
    pub fn generate_insert_list(&self, queries: &[SqlQuery]) -> Result<Vec<String>> {
        let generated = self.generate_rows(queries)?;
        Ok(self.renderer().render_list(&generated.rows))
    }

    /// INSERT statements for the stored rows matching every column of `row`
    pub fn generate_insert_list_for_row(&self, row: &Row) -> Result<Vec<String>> {
        let generated = self.generate_rows_for_row(row)?;
        Ok(self.renderer().render_list(&generated.rows))
    }

    fn renderer(&self) -> InsertRenderer {
        InsertRenderer::new(self.dialect)
    }

    fn ordered(&self, closed: ClosedRows) -> GeneratedRows {
        GeneratedRows {
            rows: RowOrderer::new(self.metadata.as_ref()).order(closed.rows),
            stats: closed.stats,
        }
    }
}
