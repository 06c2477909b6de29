//! Minimal SQL tokenizer.
//!
//! Just enough lexing to find clause keywords, identifiers and commas at the
//! top nesting level without being fooled by string literals, quoted
//! identifiers or comments. Token spans index into the original text so
//! callers can slice clauses out verbatim.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: keyword, identifier or function name
    Word,
    /// `"name"`, `` `name` `` or `[name]`
    QuotedIdent,
    /// `'text'`
    String,
    Number,
    /// `?`, `$1`, `:name`
    Param,
    /// Any other single punctuation character
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// Nesting depth in parentheses at the token start
    pub depth: usize,
}

impl Token {
    pub fn text<'a>(&self, sql: &'a str) -> &'a str {
        &sql[self.start..self.end]
    }

    /// Identifier text with any quoting removed
    pub fn ident<'a>(&self, sql: &'a str) -> &'a str {
        let text = self.text(sql);
        match self.kind {
            TokenKind::QuotedIdent if text.len() >= 2 => &text[1..text.len() - 1],
            _ => text,
        }
    }

    pub fn is_word(&self, sql: &str, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text(sql).eq_ignore_ascii_case(word)
    }

    pub fn is_symbol(&self, sql: &str, symbol: char) -> bool {
        self.kind == TokenKind::Symbol && self.text(sql).starts_with(symbol)
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::QuotedIdent)
    }
}

/// Tokenize `sql`, dropping whitespace and comments.
///
/// Never fails: an unterminated literal runs to the end of the input.
pub fn tokenize(sql: &str) -> Vec<Token> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let start = i;

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if b == b'-' && bytes.get(i + 1) == Some(&b'-') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i += 2;
            while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }

        let kind = match b {
            b'\'' => {
                i = scan_quoted(bytes, i, b'\'');
                TokenKind::String
            }
            b'"' | b'`' => {
                i = scan_quoted(bytes, i, b);
                TokenKind::QuotedIdent
            }
            b'[' => {
                i = scan_quoted(bytes, i, b']');
                TokenKind::QuotedIdent
            }
            b'?' => {
                i += 1;
                TokenKind::Param
            }
            b'$' | b':' if bytes.get(i + 1).is_some_and(|c| c.is_ascii_alphanumeric()) => {
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                TokenKind::Param
            }
            b'0'..=b'9' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                TokenKind::Number
            }
            b'.' if bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                TokenKind::Number
            }
            c if c.is_ascii_alphabetic() || c == b'_' || c >= 0x80 => {
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric()
                        || bytes[i] == b'_'
                        || bytes[i] == b'$'
                        || bytes[i] >= 0x80)
                {
                    i += 1;
                }
                TokenKind::Word
            }
            _ => {
                i += 1;
                TokenKind::Symbol
            }
        };

        let token_depth = depth;
        if kind == TokenKind::Symbol {
            match b {
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        let depth_at = if kind == TokenKind::Symbol && b == b')' {
            depth
        } else {
            token_depth
        };

        tokens.push(Token {
            kind,
            start,
            end: i,
            depth: depth_at,
        });
    }

    tokens
}

/// Index just past the closing `close` of a literal opened at `open`.
/// A doubled closing character is an escaped one.
fn scan_quoted(bytes: &[u8], open: usize, close: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == close {
            if bytes.get(i + 1) == Some(&close) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Split a script into statements at top-level semicolons.
/// Empty statements are dropped; comments inside statements are kept.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut start = 0;

    for token in tokenize(script) {
        if token.kind == TokenKind::Symbol && token.text(script) == ";" {
            push_statement(&mut statements, &script[start..token.start]);
            start = token.end;
        }
    }
    push_statement(&mut statements, &script[start..]);

    statements
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !tokenize(trimmed).is_empty() {
        statements.push(trimmed.to_string());
    }
}

/// Split a token slice at top-level commas (relative to `depth`)
pub fn split_top_level<'t>(tokens: &'t [Token], sql: &str, depth: usize) -> Vec<&'t [Token]> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.depth == depth && token.is_symbol(sql, ',') {
            parts.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    if start < tokens.len() {
        parts.push(&tokens[start..]);
    }
    parts
}
