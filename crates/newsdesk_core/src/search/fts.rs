//! SQLite FTS5 search over archived titles, summaries and bodies.
//!
//! # Invariants
//! - Plain queries never reach FTS5 unescaped.
//! - Ordering is bm25 rank, then newest first, then id.

use crate::db::DbError;
use crate::model::item::ItemId;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    /// Raw FTS5 expression rejected by SQLite.
    InvalidQuery {
        query: String,
        message: String,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidQuery { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    /// Restricts hits to one category, matched exactly.
    pub category: Option<String>,
    pub limit: u32,
    /// Pass `text` to FTS5 as-is instead of quoting each term.
    pub raw_fts_syntax: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
            limit: 20,
            raw_fts_syntax: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub item_id: ItemId,
    pub title: String,
    /// Matched fragment with hits wrapped in `[` `]`.
    pub snippet: String,
}

/// Runs a ranked full-text query. Blank text or a zero limit yields no hits.
pub fn search_news(conn: &Connection, query: &SearchQuery) -> SearchResult<Vec<SearchHit>> {
    let Some(match_expr) = build_match_expression(query) else {
        return Ok(Vec::new());
    };
    if query.limit == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT
            news_items.id AS id,
            news_items.title AS title,
            snippet(news_fts, -1, '[', ']', ' ... ', 12) AS snippet
         FROM news_fts
         JOIN news_items ON news_items.rowid = news_fts.rowid
         WHERE news_fts MATCH ?",
    );
    let mut bind_values: Vec<Value> = vec![Value::Text(match_expr.clone())];

    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        sql.push_str(" AND news_items.category = ?");
        bind_values.push(Value::Text(category.to_string()));
    }

    sql.push_str(
        " ORDER BY bm25(news_fts), news_items.published_at DESC, news_items.id ASC LIMIT ?",
    );
    bind_values.push(Value::Integer(i64::from(query.limit)));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, &match_expr))?;
    let mut hits = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        hits.push(parse_search_hit(row)?);
    }
    Ok(hits)
}

fn parse_search_hit(row: &Row<'_>) -> SearchResult<SearchHit> {
    let id_text: String = row.get("id")?;
    let item_id = ItemId::parse(&id_text)
        .ok_or_else(|| SearchError::InvalidData("empty item id".to_string()))?;
    Ok(SearchHit {
        item_id,
        title: row.get("title")?,
        snippet: row.get("snippet")?,
    })
}

/// Builds the MATCH expression: each whitespace term quoted, joined with AND.
pub fn build_match_expression(query: &SearchQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        return None;
    }
    if query.raw_fts_syntax {
        return Some(text.to_string());
    }
    let terms = text.split_whitespace().map(escape_fts_term).collect::<Vec<_>>();
    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }
    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
                || msg.contains("no such column")
        }
        _ => false,
    }
}
