//! Target database dialects.
//!
//! A dialect decides two things: how values are written as literals and how
//! unquoted table names are folded by the catalog.

use crate::value::format::BlobStyle;
use crate::value::{LiteralFormatter, OracleFormatter, StandardFormatter, Value};
use serde::{Deserialize, Serialize};

static STANDARD: StandardFormatter = StandardFormatter::new(BlobStyle::XQuoted);
static POSTGRES: StandardFormatter = StandardFormatter::new(BlobStyle::Bytea);
static SQL_SERVER: StandardFormatter =
    StandardFormatter::new(BlobStyle::HexPrefix).with_bool_as_int();
static ORACLE: OracleFormatter = OracleFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    DuckDb,
    Postgres,
    MySql,
    MariaDb,
    H2,
    HsqlDb,
    SqlServer,
    Oracle,
    Other,
}

impl Dialect {
    /// Literal formatting strategy for this dialect
    pub fn formatter(&self) -> &'static dyn LiteralFormatter {
        match self {
            Dialect::Oracle => &ORACLE,
            Dialect::SqlServer => &SQL_SERVER,
            Dialect::Postgres => &POSTGRES,
            _ => &STANDARD,
        }
    }

    pub fn format_value(&self, value: &Value) -> String {
        self.formatter().format(value)
    }

    /// Fold a table name the way this dialect's catalog stores unquoted
    /// identifiers. Quoted names are unquoted and kept verbatim.
    pub fn normalize_identifier(&self, name: &str) -> String {
        let trimmed = name.trim();
        if let Some(inner) = strip_identifier_quotes(trimmed) {
            return inner.to_string();
        }
        match self {
            Dialect::Oracle | Dialect::H2 | Dialect::HsqlDb => trimmed.to_uppercase(),
            Dialect::Postgres => trimmed.to_lowercase(),
            _ => trimmed.to_string(),
        }
    }

    /// Clause that keeps only the first row of a lookup query, as
    /// `(prefix after SELECT, suffix after WHERE)`.
    pub fn first_row_clauses(&self) -> (&'static str, &'static str) {
        match self {
            Dialect::SqlServer => ("TOP 1 ", ""),
            Dialect::Oracle => ("", " FETCH FIRST 1 ROWS ONLY"),
            _ => ("", " LIMIT 1"),
        }
    }
}

fn strip_identifier_quotes(name: &str) -> Option<&str> {
    let bytes = name.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    match (bytes[0], bytes[bytes.len() - 1]) {
        (b'"', b'"') | (b'`', b'`') | (b'[', b']') => Some(&name[1..name.len() - 1]),
        _ => None,
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duckdb" => Ok(Dialect::DuckDb),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "mariadb" => Ok(Dialect::MariaDb),
            "h2" => Ok(Dialect::H2),
            "hsqldb" | "hsql" => Ok(Dialect::HsqlDb),
            "sqlserver" | "mssql" | "tsql" => Ok(Dialect::SqlServer),
            "oracle" => Ok(Dialect::Oracle),
            "other" | "ansi" => Ok(Dialect::Other),
            _ => Err(format!(
                "Unknown dialect: {}. Valid options: duckdb, postgres, mysql, mariadb, h2, hsqldb, sqlserver, oracle, other",
                s
            )),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::MySql => write!(f, "mysql"),
            Dialect::MariaDb => write!(f, "mariadb"),
            Dialect::H2 => write!(f, "h2"),
            Dialect::HsqlDb => write!(f, "hsqldb"),
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::Oracle => write!(f, "oracle"),
            Dialect::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_round_trip() {
        for d in [
            Dialect::DuckDb,
            Dialect::Postgres,
            Dialect::MySql,
            Dialect::MariaDb,
            Dialect::H2,
            Dialect::HsqlDb,
            Dialect::SqlServer,
            Dialect::Oracle,
            Dialect::Other,
        ] {
            assert_eq!(d.to_string().parse::<Dialect>().unwrap(), d);
        }
        assert!("db2".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_identifier_folding() {
        assert_eq!(Dialect::Oracle.normalize_identifier("player"), "PLAYER");
        assert_eq!(Dialect::H2.normalize_identifier("\"Player\""), "Player");
        assert_eq!(Dialect::MySql.normalize_identifier("Player"), "Player");
        assert_eq!(Dialect::Postgres.normalize_identifier("Player"), "player");
    }
}
