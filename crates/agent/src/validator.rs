//! SQL safety validator: the boundary between whatever the model emitted
//! and the database. Everything is checked at the token level with a
//! string-literal-aware scanner, so keywords hidden in literals do not
//! trigger false rejections and terminators hidden in literals do not
//! smuggle second statements.
//!
//! Template-origin statements are trusted by construction and skip the
//! content checks, but the row-limit clamp applies to every statement
//! without exception.

use std::collections::HashSet;

use licibot_core::domain::query::{CandidateQuery, QueryOrigin};
use licibot_core::schema::SchemaWhitelist;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationVerdict {
    /// Statement is safe to execute; `sql` carries the rewritten form with
    /// the limit clause injected or clamped.
    Accepted { sql: String },
    Rejected { reason: String },
}

impl ValidationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

pub struct SqlValidator {
    whitelist: SchemaWhitelist,
    max_limit: u32,
    default_limit: u32,
}

const FORBIDDEN_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "grant", "revoke", "truncate",
    "replace", "attach", "detach", "pragma", "vacuum", "reindex", "into", "union",
];

const ALLOWED_KEYWORDS: &[&str] = &[
    "select", "from", "where", "and", "or", "not", "in", "is", "null", "like", "glob", "between",
    "group", "by", "order", "having", "limit", "offset", "as", "on", "join", "inner", "left",
    "right", "outer", "cross", "distinct", "all", "case", "when", "then", "else", "end", "asc",
    "desc", "exists", "count", "sum", "avg", "min", "max", "total", "upper", "lower", "length",
    "substr", "trim", "abs", "round", "coalesce", "ifnull", "nullif", "cast", "date", "time",
    "datetime", "strftime", "integer", "real", "text", "escape", "collate", "nocase",
];

impl SqlValidator {
    pub fn new(whitelist: SchemaWhitelist, max_limit: u32, default_limit: u32) -> Self {
        Self { whitelist, max_limit: max_limit.max(1), default_limit: default_limit.max(1) }
    }

    pub fn validate(&self, candidate: &CandidateQuery) -> ValidationVerdict {
        let tokens = match tokenize(&candidate.sql) {
            Ok(tokens) => tokens,
            Err(reason) => return ValidationVerdict::Rejected { reason },
        };

        if tokens.is_empty() {
            return ValidationVerdict::Rejected { reason: "empty statement".to_string() };
        }

        // One trailing terminator is tolerated and dropped; a terminator
        // followed by anything else is a second statement.
        let terminator = tokens.iter().position(|spanned| spanned.token == Token::Terminator);
        let effective = match terminator {
            Some(position) if position + 1 < tokens.len() => {
                return ValidationVerdict::Rejected {
                    reason: "statement terminator followed by additional content".to_string(),
                };
            }
            Some(position) => &tokens[..position],
            None => &tokens[..],
        };

        if effective.is_empty() {
            return ValidationVerdict::Rejected { reason: "empty statement".to_string() };
        }

        if candidate.origin == QueryOrigin::Llm {
            if let Err(reason) = self.check_content(effective) {
                return ValidationVerdict::Rejected { reason };
            }
        }

        // Cut after the last effective token (drops a trailing terminator)
        // but keep the prefix intact so token spans stay valid for the
        // limit rewrite below.
        let end = effective.last().map(|spanned| spanned.end).unwrap_or(0);
        let base_sql = candidate.sql[..end].to_string();

        match self.enforce_limit(base_sql, effective) {
            Ok(sql) => ValidationVerdict::Accepted { sql },
            Err(reason) => ValidationVerdict::Rejected { reason },
        }
    }

    fn check_content(&self, tokens: &[Spanned]) -> Result<(), String> {
        match tokens.first() {
            Some(Spanned { token: Token::Word(first), .. }) if first == "select" => {}
            _ => return Err("only a single SELECT statement is allowed".to_string()),
        }

        for spanned in tokens {
            if let Token::Word(word) = &spanned.token {
                if FORBIDDEN_KEYWORDS.contains(&word.as_str()) {
                    return Err(format!("forbidden keyword `{word}`"));
                }
            }
        }

        let aliases = collect_aliases(tokens);
        for spanned in tokens {
            let Token::Word(word) = &spanned.token else {
                continue;
            };
            if ALLOWED_KEYWORDS.contains(&word.as_str()) {
                continue;
            }
            if aliases.contains(word.as_str()) {
                continue;
            }
            if !self.whitelist.is_known(word) {
                return Err(format!("unknown identifier `{word}`"));
            }
        }

        Ok(())
    }

    /// Inject a `LIMIT` when absent, clamp it when above the ceiling.
    /// Idempotent: re-validating an already-clamped statement is a no-op.
    fn enforce_limit(&self, sql: String, tokens: &[Spanned]) -> Result<String, String> {
        let limit_position = tokens
            .iter()
            .rposition(|spanned| matches!(&spanned.token, Token::Word(word) if word == "limit"));

        let Some(position) = limit_position else {
            return Ok(format!("{sql} LIMIT {}", self.default_limit));
        };

        let Some(first) = tokens.get(position + 1) else {
            return Err("LIMIT clause is missing its row count".to_string());
        };
        let Token::Number(_) = &first.token else {
            return Err("LIMIT clause must use a literal number".to_string());
        };

        // `LIMIT offset, count` puts the row count second.
        let count_token = match (tokens.get(position + 2), tokens.get(position + 3)) {
            (Some(comma), Some(count))
                if comma.token == Token::Punct(',')
                    && matches!(count.token, Token::Number(_)) =>
            {
                count
            }
            _ => first,
        };

        let Token::Number(raw) = &count_token.token else {
            return Err("LIMIT clause must use a literal number".to_string());
        };
        let over_ceiling = raw.parse::<u64>().map(|n| n > u64::from(self.max_limit)).unwrap_or(true);
        if !over_ceiling {
            return Ok(sql);
        }

        let mut clamped = sql;
        clamped.replace_range(count_token.start..count_token.end, &self.max_limit.to_string());
        Ok(clamped)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Number(String),
    Str,
    Punct(char),
    Terminator,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Spanned {
    token: Token,
    start: usize,
    end: usize,
}

fn tokenize(sql: &str) -> Result<Vec<Spanned>, String> {
    let mut tokens = Vec::new();
    let mut chars = sql.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }

        if ch == '\'' {
            let mut closed = false;
            while let Some((_, inner)) = chars.next() {
                if inner == '\'' {
                    // Doubled quote is an escaped quote inside the literal.
                    if matches!(chars.peek(), Some((_, '\''))) {
                        chars.next();
                        continue;
                    }
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err("unterminated string literal".to_string());
            }
            let end = chars.peek().map(|(index, _)| *index).unwrap_or(sql.len());
            tokens.push(Spanned { token: Token::Str, start, end });
            continue;
        }

        if ch == '-' && matches!(chars.peek(), Some((_, '-'))) {
            return Err("sql comments are not allowed".to_string());
        }
        if ch == '/' && matches!(chars.peek(), Some((_, '*'))) {
            return Err("sql comments are not allowed".to_string());
        }

        if ch == ';' {
            tokens.push(Spanned { token: Token::Terminator, start, end: start + 1 });
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let mut end = start + ch.len_utf8();
            while let Some((index, next)) = chars.peek().copied() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    end = index + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let word = sql[start..end].to_ascii_lowercase();
            tokens.push(Spanned { token: Token::Word(word), start, end });
            continue;
        }

        if ch.is_ascii_digit() {
            let mut end = start + 1;
            let mut seen_dot = false;
            while let Some((index, next)) = chars.peek().copied() {
                if next.is_ascii_digit() || (next == '.' && !seen_dot) {
                    seen_dot = seen_dot || next == '.';
                    end = index + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let number = sql[start..end].to_string();
            tokens.push(Spanned { token: Token::Number(number), start, end });
            continue;
        }

        tokens.push(Spanned { token: Token::Punct(ch), start, end: start + ch.len_utf8() });
    }

    Ok(tokens)
}

fn is_allowed_keyword(word: &str) -> bool {
    ALLOWED_KEYWORDS.contains(&word)
}

/// Collect table aliases (`FROM t x`, `JOIN t x`) and column aliases
/// (`expr AS x`) so later references to them pass the whitelist check.
fn collect_aliases(tokens: &[Spanned]) -> HashSet<String> {
    let mut aliases = HashSet::new();
    let words: Vec<Option<&str>> = tokens
        .iter()
        .map(|spanned| match &spanned.token {
            Token::Word(word) => Some(word.as_str()),
            _ => None,
        })
        .collect();

    for index in 0..tokens.len() {
        let Some(word) = words[index] else {
            continue;
        };

        if word == "as" {
            if let Some(Some(alias)) = words.get(index + 1) {
                if !is_allowed_keyword(alias) {
                    aliases.insert((*alias).to_string());
                }
            }
        }

        if word == "from" || word == "join" {
            let Some(Some(table)) = words.get(index + 1) else {
                continue;
            };
            if is_allowed_keyword(table) {
                continue;
            }
            // The word right after the table name, unless it is a keyword
            // or punctuation, is a bare table alias.
            if let Some(Some(alias)) = words.get(index + 2) {
                if *alias == "as" {
                    continue; // handled by the AS branch
                }
                if !is_allowed_keyword(alias) {
                    aliases.insert((*alias).to_string());
                }
            }
        }
    }

    aliases
}
