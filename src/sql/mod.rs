//! Lightweight SQL text handling: tokenizing, statement splitting,
//! UPDATE/DELETE rewriting and SELECT shape analysis.

pub mod lexer;
pub mod rewrite;
pub mod select;

pub use lexer::split_statements;
pub use rewrite::{statement_kind, to_select, StatementKind};
pub use select::{analyze, table_references, FromItem, SelectItem, SelectShape};
