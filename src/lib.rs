//! Generate the minimal, ordered set of INSERT statements that recreates the
//! rows a SQL statement touches, together with every row those need to
//! satisfy foreign keys and NOT NULL constraints.
//!
//! The pipeline is: statement → [`source::RowSource`] (seed rows) →
//! [`closure::ClosureBuilder`] (merge, backfill, follow foreign keys) →
//! [`order::RowOrderer`] → [`render::InsertRenderer`]. [`FixtureGenerator`]
//! wires it together over a DuckDB [`Database`].

pub mod closure;
pub mod config;
pub mod database;
pub mod dialect;
pub mod generator;
pub mod metadata;
pub mod order;
pub mod query;
pub mod render;
pub mod row;
pub mod schema;
pub mod source;
pub mod sql;
pub mod value;

pub use closure::{BackfillQuery, ClosedRows, ClosureBuilder, ClosureStats, NoBackfill};
pub use database::Database;
pub use dialect::Dialect;
pub use generator::{FixtureGenerator, GeneratedRows};
pub use metadata::{
    CachedMetadata, ColumnsMapping, ColumnsMappingGroup, DuckDbMetadata, MetadataProvider,
    ReferencedTable, ReferencedTableSet, SchemaMetadata,
};
pub use order::RowOrderer;
pub use query::SqlQuery;
pub use render::InsertRenderer;
pub use row::Row;
pub use value::Value;
