//! Shallow structure of a SELECT: its projection and its FROM items.
//!
//! Used to attribute each result column to the table it was read from.
//! Only the outermost query block is examined; derived tables, table
//! functions and CTE bodies are reported but not looked into.

use super::lexer::{split_top_level, tokenize, Token};

const CLAUSE_END: &[&str] = &[
    "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "UNION", "INTERSECT", "EXCEPT",
    "WINDOW", "QUALIFY", "FETCH", "FOR",
];

const JOIN_WORDS: &[&str] = &["JOIN", "LEFT", "RIGHT", "INNER", "OUTER", "FULL", "CROSS", "NATURAL"];

const ALIAS_STOP: &[&str] = &[
    "ON", "USING", "JOIN", "LEFT", "RIGHT", "INNER", "OUTER", "FULL", "CROSS", "NATURAL",
    "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "UNION", "INTERSECT", "EXCEPT",
    "WINDOW", "QUALIFY", "FETCH", "FOR", "TABLESAMPLE",
];

/// One entry of the FROM clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromItem {
    Table { name: String, alias: Option<String> },
    /// Subquery or table function, optionally aliased
    Derived { alias: Option<String> },
}

impl FromItem {
    /// Name the item is referred to by in the select list
    pub fn reference(&self) -> Option<&str> {
        match self {
            FromItem::Table { name, alias } => Some(alias.as_deref().unwrap_or(name)),
            FromItem::Derived { alias } => alias.as_deref(),
        }
    }

    pub fn table_name(&self) -> Option<&str> {
        match self {
            FromItem::Table { name, .. } => Some(name),
            FromItem::Derived { .. } => None,
        }
    }

    pub fn is_referenced_as(&self, qualifier: &str) -> bool {
        self.reference()
            .is_some_and(|r| r.eq_ignore_ascii_case(qualifier))
            || self
                .table_name()
                .is_some_and(|t| t.eq_ignore_ascii_case(qualifier))
    }
}

/// One entry of the select list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// `*`
    Wildcard,
    /// `q.*`
    QualifiedWildcard(String),
    /// `[q.]column [[AS] alias]`
    Column {
        qualifier: Option<String>,
        name: String,
    },
    /// Anything computed
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectShape {
    pub items: Vec<SelectItem>,
    pub from: Vec<FromItem>,
}

/// Analyze a plain `SELECT ... FROM ...`; `None` for other statement shapes
pub fn analyze(sql: &str) -> Option<SelectShape> {
    let tokens = tokenize(sql);
    if !tokens.first()?.is_word(sql, "SELECT") {
        return None;
    }

    let from_at = tokens
        .iter()
        .position(|t| t.depth == 0 && t.is_word(sql, "FROM"))?;

    let mut list_start = 1;
    while let Some(t) = tokens.get(list_start) {
        if t.is_word(sql, "DISTINCT") || t.is_word(sql, "ALL") {
            list_start += 1;
            // DISTINCT ON (..)
            if tokens.get(list_start).is_some_and(|t| t.is_word(sql, "ON")) {
                list_start = skip_parenthesized(sql, &tokens, list_start + 1);
            }
        } else if t.is_word(sql, "TOP") {
            list_start = skip_parenthesized(sql, &tokens, list_start + 1);
        } else {
            break;
        }
    }
    if list_start >= from_at {
        return None;
    }

    let items = split_top_level(&tokens[list_start..from_at], sql, 0)
        .into_iter()
        .map(|item| select_item(sql, item))
        .collect();

    let from_end = tokens[from_at + 1..]
        .iter()
        .position(|t| t.depth == 0 && CLAUSE_END.iter().any(|w| t.is_word(sql, w)))
        .map_or(tokens.len(), |p| p + from_at + 1);

    let from = from_items(sql, &tokens[from_at + 1..from_end]);

    Some(SelectShape { items, from })
}

/// Every table named after `FROM` or `JOIN`, at any nesting level, in order
/// of appearance and without duplicates. Table functions are left out.
pub fn table_references(sql: &str) -> Vec<String> {
    let tokens = tokenize(sql);
    let mut names: Vec<String> = Vec::new();

    for (i, t) in tokens.iter().enumerate() {
        if !(t.is_word(sql, "FROM") || t.is_word(sql, "JOIN")) {
            continue;
        }
        let mut rest = &tokens[i + 1..];
        if rest.first().is_some_and(|t| t.is_word(sql, "LATERAL")) {
            rest = &rest[1..];
        }
        let (path, after) = dotted_path(sql, rest);
        let Some(name) = path.last() else {
            continue;
        };
        if rest.get(after).is_some_and(|t| t.is_symbol(sql, '(')) {
            continue;
        }
        if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            names.push(name.clone());
        }
    }
    names
}

/// Index after a single token or a parenthesized group starting at `i`
fn skip_parenthesized(sql: &str, tokens: &[Token], i: usize) -> usize {
    match tokens.get(i) {
        Some(open) if open.is_symbol(sql, '(') => tokens[i + 1..]
            .iter()
            .position(|t| t.depth == open.depth && t.is_symbol(sql, ')'))
            .map_or(tokens.len(), |p| p + i + 2),
        Some(_) => i + 1,
        None => i,
    }
}

/// Dotted identifier path at the start of `tokens`, and the index after it
fn dotted_path(sql: &str, tokens: &[Token]) -> (Vec<String>, usize) {
    let mut parts = Vec::new();
    let mut i = 0;
    while let Some(t) = tokens.get(i) {
        if !t.is_identifier() {
            break;
        }
        parts.push(t.ident(sql).to_string());
        i += 1;
        if tokens.get(i).is_some_and(|t| t.is_symbol(sql, '.')) {
            i += 1;
        } else {
            break;
        }
    }
    (parts, i)
}

fn select_item(sql: &str, tokens: &[Token]) -> SelectItem {
    match tokens {
        [star] if star.is_symbol(sql, '*') => return SelectItem::Wildcard,
        [q, dot, star]
            if q.is_identifier() && dot.is_symbol(sql, '.') && star.is_symbol(sql, '*') =>
        {
            return SelectItem::QualifiedWildcard(q.ident(sql).to_string())
        }
        _ => {}
    }

    let (mut path, mut i) = dotted_path(sql, tokens);
    // A trailing dot means the path did not end on an identifier
    if path.is_empty() || tokens.get(i - 1).is_some_and(|t| t.is_symbol(sql, '.')) {
        return SelectItem::Expression;
    }

    if tokens.get(i).is_some_and(|t| t.is_word(sql, "AS")) {
        i += 1;
    }
    if tokens.get(i).is_some_and(Token::is_identifier) {
        i += 1;
    }
    if i != tokens.len() {
        return SelectItem::Expression;
    }

    let name = path.pop().unwrap_or_default();
    SelectItem::Column {
        qualifier: path.pop(),
        name,
    }
}

fn from_items(sql: &str, tokens: &[Token]) -> Vec<FromItem> {
    let mut segments: Vec<&[Token]> = Vec::new();
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        let separator =
            t.depth == 0 && (t.is_symbol(sql, ',') || JOIN_WORDS.iter().any(|w| t.is_word(sql, w)));
        if separator {
            if start < i {
                segments.push(&tokens[start..i]);
            }
            start = i + 1;
        }
    }
    if start < tokens.len() {
        segments.push(&tokens[start..]);
    }

    segments
        .into_iter()
        .filter_map(|segment| from_item(sql, segment))
        .collect()
}

fn from_item(sql: &str, tokens: &[Token]) -> Option<FromItem> {
    let mut tokens = tokens;
    if tokens.first()?.is_word(sql, "LATERAL") {
        tokens = &tokens[1..];
    }
    let first = tokens.first()?;

    if first.is_symbol(sql, '(') {
        let after = skip_parenthesized(sql, tokens, 0);
        return Some(FromItem::Derived {
            alias: alias_at(sql, tokens, after),
        });
    }

    let (path, i) = dotted_path(sql, tokens);
    let name = path.last()?.clone();
    if tokens.get(i).is_some_and(|t| t.is_symbol(sql, '(')) {
        let after = skip_parenthesized(sql, tokens, i);
        return Some(FromItem::Derived {
            alias: alias_at(sql, tokens, after),
        });
    }

    Some(FromItem::Table {
        name,
        alias: alias_at(sql, tokens, i),
    })
}

fn alias_at(sql: &str, tokens: &[Token], mut i: usize) -> Option<String> {
    if tokens.get(i).is_some_and(|t| t.is_word(sql, "AS")) {
        i += 1;
    }
    let t = tokens.get(i)?;
    if !t.is_identifier() || ALIAS_STOP.iter().any(|w| t.is_word(sql, w)) {
        return None;
    }
    Some(t.ident(sql).to_string())
}
