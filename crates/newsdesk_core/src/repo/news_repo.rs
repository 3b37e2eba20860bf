//! News archive repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist normalized items and their tag links.
//! - Serve newest-first listings filtered by tag or category.
//!
//! # Invariants
//! - `upsert_items` is all-or-nothing and replaces an item's tag set.
//! - Read paths reject rows that cannot be turned back into a `NewsItem`.

use crate::db::DbError;
use crate::model::item::{ItemId, NewsItem};
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NEWS_DEFAULT_LIMIT: u32 = 24;
pub const NEWS_LIMIT_MAX: u32 = 100;

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    title,
    link,
    domain,
    source,
    summary,
    content_html,
    image,
    category,
    published_at
FROM news_items";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// Item rejected before any SQL ran.
    InvalidItem(String),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidItem(message) => write!(f, "invalid news item: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid archived item data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidItem(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Listing filter; `limit` is normalized by [`normalize_news_limit`].
#[derive(Debug, Clone, Default)]
pub struct NewsListQuery {
    /// Exact tag match, case-insensitive.
    pub tag: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Tag name with the number of archived items carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub name: String,
    pub count: u64,
}

pub trait NewsRepository {
    /// Inserts or updates items; returns how many rows were written.
    fn upsert_items(&mut self, items: &[NewsItem]) -> RepoResult<usize>;
    fn get_item(&self, id: &ItemId) -> RepoResult<Option<NewsItem>>;
    fn list_items(&self, query: &NewsListQuery) -> RepoResult<Vec<NewsItem>>;
    /// Counts items matching the filter, ignoring limit and offset.
    fn count_items(&self, query: &NewsListQuery) -> RepoResult<u64>;
    /// Tags by descending usage, then name.
    fn list_tags(&self) -> RepoResult<Vec<TagCount>>;
}

pub struct SqliteNewsRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNewsRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl NewsRepository for SqliteNewsRepository<'_> {
    fn upsert_items(&mut self, items: &[NewsItem]) -> RepoResult<usize> {
        for item in items {
            validate_item(item)?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for item in items {
            upsert_item(&tx, item)?;
            replace_tags(&tx, item)?;
        }
        tx.commit()?;

        info!(
            "event=archive_upsert module=repo status=ok count={}",
            items.len()
        );
        Ok(items.len())
    }

    fn get_item(&self, id: &ItemId) -> RepoResult<Option<NewsItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_item_row(&*self.conn, row)?)),
            None => Ok(None),
        }
    }

    fn list_items(&self, query: &NewsListQuery) -> RepoResult<Vec<NewsItem>> {
        let (mut sql, mut bind_values) = filtered_sql(ITEM_SELECT_SQL, query);
        sql.push_str(" ORDER BY published_at IS NULL, published_at DESC, id ASC LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(normalize_news_limit(query.limit))));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(&*self.conn, row)?);
        }
        Ok(items)
    }

    fn count_items(&self, query: &NewsListQuery) -> RepoResult<u64> {
        let (sql, bind_values) = filtered_sql("SELECT COUNT(*) FROM news_items", query);
        let count = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get::<_, i64>(0))?;
        u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count {count}")))
    }

    fn list_tags(&self) -> RepoResult<Vec<TagCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name AS name, COUNT(it.item_id) AS uses
             FROM tags t
             INNER JOIN item_tags it ON it.tag_id = t.id
             GROUP BY t.id
             ORDER BY uses DESC, t.key ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let uses: i64 = row.get("uses")?;
            tags.push(TagCount {
                name: row.get("name")?,
                count: u64::try_from(uses).unwrap_or(0),
            });
        }
        Ok(tags)
    }
}

/// Clamps a requested page size: `None`/0 gives the default, large values the max.
pub fn normalize_news_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => NEWS_DEFAULT_LIMIT,
        Some(value) => value.min(NEWS_LIMIT_MAX),
    }
}

fn validate_item(item: &NewsItem) -> RepoResult<()> {
    if item.id.as_str().trim().is_empty() {
        return Err(RepoError::InvalidItem("empty id".to_string()));
    }
    Ok(())
}

fn filtered_sql(select: &str, query: &NewsListQuery) -> (String, Vec<Value>) {
    let mut sql = format!("{select} WHERE 1 = 1");
    let mut bind_values = Vec::new();

    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        sql.push_str(" AND category = ?");
        bind_values.push(Value::Text(category.to_string()));
    }
    if let Some(tag) = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        sql.push_str(
            " AND id IN (
                SELECT it.item_id
                FROM item_tags it
                INNER JOIN tags t ON t.id = it.tag_id
                WHERE t.key = ?
            )",
        );
        bind_values.push(Value::Text(tag_key(tag)));
    }

    (sql, bind_values)
}

fn upsert_item(tx: &Transaction<'_>, item: &NewsItem) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO news_items (
            id, title, link, domain, source, summary, content_html, image, category, published_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT (id) DO UPDATE SET
            title = excluded.title,
            link = excluded.link,
            domain = excluded.domain,
            source = excluded.source,
            summary = excluded.summary,
            content_html = excluded.content_html,
            image = excluded.image,
            category = excluded.category,
            published_at = excluded.published_at;",
        params![
            item.id.as_str(),
            item.title.as_str(),
            item.link.as_str(),
            item.domain.as_str(),
            item.source.as_str(),
            item.summary.as_str(),
            item.content_html.as_str(),
            item.image.as_deref(),
            item.category.as_deref(),
            item.published_at.map(|dt| dt.timestamp_millis()),
        ],
    )?;
    Ok(())
}

fn replace_tags(tx: &Transaction<'_>, item: &NewsItem) -> RepoResult<()> {
    tx.execute("DELETE FROM item_tags WHERE item_id = ?1;", [item.id.as_str()])?;
    for (position, tag) in item.tags.iter().enumerate() {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        let key = tag_key(tag);
        tx.execute(
            "INSERT OR IGNORE INTO tags (name, key) VALUES (?1, ?2);",
            params![tag, key.as_str()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO item_tags (item_id, tag_id, position)
             SELECT ?1, id, ?3
             FROM tags
             WHERE key = ?2;",
            params![item.id.as_str(), key.as_str(), position as i64],
        )?;
    }
    Ok(())
}

fn tag_key(tag: &str) -> String {
    tag.trim().to_lowercase()
}

fn load_tags(conn: &Connection, item_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name AS name
         FROM item_tags it
         INNER JOIN tags t ON t.id = it.tag_id
         WHERE it.item_id = ?1
         ORDER BY it.position ASC;",
    )?;
    let mut rows = stmt.query([item_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get("name")?);
    }
    Ok(tags)
}

fn parse_item_row(conn: &Connection, row: &Row<'_>) -> RepoResult<NewsItem> {
    let id_text: String = row.get("id")?;
    let id = ItemId::parse(&id_text)
        .ok_or_else(|| RepoError::InvalidData("empty id in news_items.id".to_string()))?;

    let published_at = match row.get::<_, Option<i64>>("published_at")? {
        Some(millis) => Some(DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{millis}` in news_items.published_at"
            ))
        })?),
        None => None,
    };

    Ok(NewsItem {
        tags: load_tags(conn, &id_text)?,
        id,
        title: row.get("title")?,
        link: row.get("link")?,
        domain: row.get("domain")?,
        source: row.get("source")?,
        summary: row.get("summary")?,
        content_html: row.get("content_html")?,
        image: row.get("image")?,
        category: row.get("category")?,
        published_at,
    })
}

#[cfg(test)]
mod tests {
    use super::{normalize_news_limit, NEWS_DEFAULT_LIMIT, NEWS_LIMIT_MAX};

    #[test]
    fn limit_is_defaulted_and_clamped() {
        assert_eq!(normalize_news_limit(None), NEWS_DEFAULT_LIMIT);
        assert_eq!(normalize_news_limit(Some(0)), NEWS_DEFAULT_LIMIT);
        assert_eq!(normalize_news_limit(Some(7)), 7);
        assert_eq!(normalize_news_limit(Some(1_000)), NEWS_LIMIT_MAX);
    }
}
