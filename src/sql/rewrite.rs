//! Turn data-modifying statements into the SELECT that reads the rows they
//! would touch.
//!
//! - `SELECT` / `WITH` pass through unchanged
//! - `DELETE FROM t WHERE p` reads every column of the deleted rows
//! - `UPDATE t SET a = .., b = .. WHERE p` reads the pre-update values of
//!   `a`, `b` and of every column `p` mentions
//!
//! Anything else yields `None`, which callers treat as "no rows".

use super::lexer::{split_top_level, tokenize, Token, TokenKind};
use ahash::AHashSet;

const WHERE_KEYWORDS: &[&str] = &[
    "ALL", "AND", "ANY", "AS", "BETWEEN", "CASE", "COLLATE", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "DATE", "DISTINCT", "ELSE", "END", "ESCAPE", "EXISTS", "FALSE", "FROM",
    "GLOB", "ILIKE", "IN", "INTERVAL", "IS", "LIKE", "NOT", "NULL", "OR", "REGEXP", "RLIKE",
    "SELECT", "SIMILAR", "SOME", "THEN", "TIME", "TIMESTAMP", "TO", "TRUE", "UNKNOWN", "WHEN",
    "WHERE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Update,
    Delete,
    Other,
}

pub fn statement_kind(sql: &str) -> StatementKind {
    let tokens = tokenize(sql);
    match tokens.first() {
        Some(t) if t.is_word(sql, "SELECT") || t.is_word(sql, "WITH") => StatementKind::Select,
        Some(t) if t.is_word(sql, "UPDATE") => StatementKind::Update,
        Some(t) if t.is_word(sql, "DELETE") => StatementKind::Delete,
        _ => StatementKind::Other,
    }
}

/// SELECT reading the rows `sql` reads or modifies, if it can be derived
pub fn to_select(sql: &str) -> Option<String> {
    let tokens = tokenize(sql);
    let end = tokens
        .iter()
        .rposition(|t| !t.is_symbol(sql, ';'))
        .map(|i| i + 1)?;
    let tokens = &tokens[..end];

    match statement_kind(sql) {
        StatementKind::Select => Some(sql[tokens[0].start..tokens[end - 1].end].to_string()),
        StatementKind::Delete => delete_to_select(sql, tokens),
        StatementKind::Update => update_to_select(sql, tokens),
        StatementKind::Other => None,
    }
}

/// A table reference with an optional alias, as `(source text, next index)`
fn table_ref<'a>(sql: &'a str, tokens: &[Token], mut i: usize, stop: &[&str]) -> Option<(&'a str, usize)> {
    let first = tokens.get(i)?;
    if !first.is_identifier() {
        return None;
    }
    let start = first.start;
    let mut end = first.end;
    i += 1;

    // schema.table
    while tokens.get(i).is_some_and(|t| t.is_symbol(sql, '.'))
        && tokens.get(i + 1).is_some_and(Token::is_identifier)
    {
        end = tokens[i + 1].end;
        i += 2;
    }

    if tokens.get(i).is_some_and(|t| t.is_word(sql, "AS")) {
        i += 1;
    }
    if let Some(alias) = tokens.get(i) {
        let is_stop = stop.iter().any(|w| alias.is_word(sql, w));
        if alias.is_identifier() && !is_stop {
            end = alias.end;
            i += 1;
        }
    }

    Some((&sql[start..end], i))
}

fn position_of_word(sql: &str, tokens: &[Token], from: usize, words: &[&str]) -> Option<usize> {
    tokens[from..]
        .iter()
        .position(|t| t.depth == 0 && words.iter().any(|w| t.is_word(sql, w)))
        .map(|p| p + from)
}

fn delete_to_select(sql: &str, tokens: &[Token]) -> Option<String> {
    let mut i = 1;
    if tokens.get(i).is_some_and(|t| t.is_word(sql, "FROM")) {
        i += 1;
    }
    let (from, i) = table_ref(sql, tokens, i, &["WHERE", "USING", "RETURNING"])?;

    let returning = position_of_word(sql, tokens, i, &["RETURNING"]).unwrap_or(tokens.len());
    match tokens.get(i) {
        None => Some(format!("SELECT * FROM {from}")),
        Some(_) if i == returning => Some(format!("SELECT * FROM {from}")),
        Some(t) if t.is_word(sql, "WHERE") => {
            let predicate = &sql[t.start..tokens[returning - 1].end];
            Some(format!("SELECT * FROM {from} {predicate}"))
        }
        Some(_) => None,
    }
}

fn update_to_select(sql: &str, tokens: &[Token]) -> Option<String> {
    let (from, i) = table_ref(sql, tokens, 1, &["SET"])?;
    if !tokens.get(i)?.is_word(sql, "SET") {
        return None;
    }

    let set_end =
        position_of_word(sql, tokens, i + 1, &["WHERE", "FROM", "RETURNING"]).unwrap_or(tokens.len());
    if tokens.get(set_end).is_some_and(|t| t.is_word(sql, "FROM")) {
        // UPDATE .. FROM joins another table: not expressible as a single-table read
        return None;
    }

    let mut columns = Vec::new();
    for assignment in split_top_level(&tokens[i + 1..set_end], sql, 0) {
        columns.extend(assigned_columns(sql, assignment)?);
    }
    if columns.is_empty() {
        return None;
    }

    let mut predicate = None;
    if tokens.get(set_end).is_some_and(|t| t.is_word(sql, "WHERE")) {
        let returning =
            position_of_word(sql, tokens, set_end, &["RETURNING"]).unwrap_or(tokens.len());
        let where_tokens = &tokens[set_end..returning];
        columns.extend(where_columns(sql, &where_tokens[1..]));
        predicate = Some(&sql[where_tokens[0].start..where_tokens[where_tokens.len() - 1].end]);
    }

    let mut seen = AHashSet::new();
    let select_list: Vec<&str> = columns
        .into_iter()
        .filter(|c| seen.insert(unquote(c).to_lowercase()))
        .collect();

    let mut select = format!("SELECT {} FROM {}", select_list.join(", "), from);
    if let Some(predicate) = predicate {
        select.push(' ');
        select.push_str(predicate);
    }
    Some(select)
}

fn unquote(name: &str) -> &str {
    name.trim_matches(|ch: char| matches!(ch, '"' | '`' | '[' | ']'))
}

/// Target columns of one `SET` assignment: `col = ..`, `t.col = ..` or
/// `(a, b) = (..)`
fn assigned_columns<'a>(sql: &'a str, assignment: &[Token]) -> Option<Vec<&'a str>> {
    let eq = assignment
        .iter()
        .position(|t| t.depth == assignment[0].depth && t.is_symbol(sql, '='))?;
    let target = &assignment[..eq];

    if target.len() >= 2 && target[0].is_symbol(sql, '(') {
        let names: Vec<&str> = split_top_level(&target[1..target.len() - 1], sql, target[0].depth + 1)
            .into_iter()
            .filter_map(|part| part.last())
            .filter(|t| t.is_identifier())
            .map(|t| t.text(sql))
            .collect();
        return (!names.is_empty()).then_some(names);
    }

    let last = target.last()?;
    last.is_identifier().then(|| vec![last.text(sql)])
}

/// Column references in a predicate, in order of appearance.
///
/// Skips keywords, literals, parameters, function names, table qualifiers,
/// the type after `AS` and everything inside subqueries.
pub fn where_columns<'a>(sql: &'a str, tokens: &[Token]) -> Vec<&'a str> {
    let mut columns = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        let next = tokens.get(i + 1);

        if token.is_symbol(sql, '(') && next.is_some_and(|t| t.is_word(sql, "SELECT")) {
            i = tokens[i + 1..]
                .iter()
                .position(|t| t.depth == token.depth && t.is_symbol(sql, ')'))
                .map_or(tokens.len(), |p| p + i + 2);
            continue;
        }

        let is_candidate = match token.kind {
            TokenKind::Word => !WHERE_KEYWORDS
                .iter()
                .any(|k| token.text(sql).eq_ignore_ascii_case(k)),
            TokenKind::QuotedIdent => true,
            _ => false,
        };
        let is_function = next.is_some_and(|t| t.is_symbol(sql, '('));
        let is_qualifier = next.is_some_and(|t| t.is_symbol(sql, '.'));
        let after_as = i > 0 && tokens[i - 1].is_word(sql, "AS");

        if is_candidate && !is_function && !is_qualifier && !after_as {
            columns.push(token.text(sql));
        }
        i += 1;
    }

    columns
}
