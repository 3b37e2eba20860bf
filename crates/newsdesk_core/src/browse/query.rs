//! Query-string navigation state.
//!
//! # Responsibility
//! - Decode `?page=`, `?id=`/`?u=`, `?i=`/`?idx=`/`?index=` and `?from=`.
//! - Resolve article lookups against a sorted feed.
//!
//! # Invariants
//! - Decoding never fails; malformed values degrade to defaults or to
//!   `ArticleLookup::Invalid`.

use crate::model::item::NewsItem;
use reqwest::Url;
use std::fmt::{Display, Formatter};

const INDEX_KEYS: &[&str] = &["i", "idx", "index"];

/// How an article page identifies its item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleLookup {
    /// Stable id with the original link as secondary key.
    ById {
        id: Option<String>,
        link: Option<String>,
    },
    /// Position in the newest-first feed.
    ByIndex(usize),
    /// An index parameter was present but not a non-negative integer.
    Invalid,
    /// No article parameters at all.
    Missing,
}

/// Decoded navigation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavQuery {
    /// Requested list page, `1` when absent or malformed.
    pub page: usize,
    pub article: ArticleLookup,
    /// List page to return to from an article.
    pub from: Option<usize>,
}

impl NavQuery {
    /// Whether the query addresses an article page.
    pub fn is_article(&self) -> bool {
        !matches!(self.article, ArticleLookup::Missing)
    }
}

/// Why an article lookup produced no item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    InvalidIndex,
    IndexOutOfRange,
    UnknownId,
    EmptyFeed,
    NoLookup,
}

impl NotFoundReason {
    /// Reader-facing explanation shown on the placeholder page.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidIndex => "Некорректный параметр ?i в адресе страницы.",
            Self::IndexOutOfRange => "Новость с таким индексом не найдена.",
            Self::UnknownId => "Новость не найдена или уже удалена из ленты.",
            Self::EmptyFeed => "Не удалось загрузить базу новостей.",
            Self::NoLookup => "В адресе страницы не указана статья.",
        }
    }
}

impl Display for NotFoundReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::InvalidIndex => "invalid_index",
            Self::IndexOutOfRange => "index_out_of_range",
            Self::UnknownId => "unknown_id",
            Self::EmptyFeed => "empty_feed",
            Self::NoLookup => "no_lookup",
        };
        f.write_str(code)
    }
}

/// Result of resolving an [`ArticleLookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Found(usize),
    NotFound(NotFoundReason),
}

/// Parses a query string with or without the leading `?`.
pub fn parse_query(query: &str) -> NavQuery {
    let trimmed = query.trim().trim_start_matches('?');
    let pairs: Vec<(String, String)> = Url::parse(&format!("http://localhost/?{trimmed}"))
        .map(|url| {
            url.query_pairs()
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default();
    let lookup_value = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim().to_string())
    };

    let page = lookup_value("page")
        .and_then(|value| parse_positive(&value))
        .unwrap_or(1);
    let from = lookup_value("from").and_then(|value| parse_positive(&value));

    let id = lookup_value("id").filter(|value| !value.is_empty());
    let link = lookup_value("u").filter(|value| !value.is_empty());
    let index = INDEX_KEYS.iter().find_map(|key| lookup_value(key));

    let article = if id.is_some() || link.is_some() {
        ArticleLookup::ById { id, link }
    } else if let Some(raw) = index {
        match raw.parse::<usize>() {
            Ok(value) => ArticleLookup::ByIndex(value),
            Err(_) => ArticleLookup::Invalid,
        }
    } else {
        ArticleLookup::Missing
    };

    NavQuery {
        page,
        article,
        from,
    }
}

fn parse_positive(value: &str) -> Option<usize> {
    value.parse::<usize>().ok().filter(|parsed| *parsed > 0)
}

/// Resolves a lookup against the newest-first feed.
///
/// Id lookups fall back to the exact original link.
pub fn resolve_article(items: &[NewsItem], lookup: &ArticleLookup) -> Resolved {
    if items.is_empty() && !matches!(lookup, ArticleLookup::Invalid) {
        return Resolved::NotFound(NotFoundReason::EmptyFeed);
    }
    match lookup {
        ArticleLookup::ById { id, link } => {
            let by_id = id
                .as_deref()
                .and_then(|id| items.iter().position(|item| item.id.as_str() == id));
            let by_link = || {
                link.as_deref()
                    .and_then(|link| items.iter().position(|item| item.link == link))
            };
            match by_id.or_else(by_link) {
                Some(index) => Resolved::Found(index),
                None => Resolved::NotFound(NotFoundReason::UnknownId),
            }
        }
        ArticleLookup::ByIndex(index) if *index < items.len() => Resolved::Found(*index),
        ArticleLookup::ByIndex(_) => Resolved::NotFound(NotFoundReason::IndexOutOfRange),
        ArticleLookup::Invalid => Resolved::NotFound(NotFoundReason::InvalidIndex),
        ArticleLookup::Missing => Resolved::NotFound(NotFoundReason::NoLookup),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_query, resolve_article, ArticleLookup, NotFoundReason, Resolved};
    use crate::model::item::NewsItem;

    #[test]
    fn page_defaults_to_one_for_garbage() {
        assert_eq!(parse_query("?page=abc").page, 1);
        assert_eq!(parse_query("page=0").page, 1);
        assert_eq!(parse_query("page=3").page, 3);
    }

    #[test]
    fn id_and_encoded_link_are_decoded() {
        let query = parse_query("?id=9f1c&u=https%3A%2F%2Fa.test%2Fx%3Fy%3D1&from=2");
        assert_eq!(
            query.article,
            ArticleLookup::ById {
                id: Some("9f1c".to_string()),
                link: Some("https://a.test/x?y=1".to_string()),
            }
        );
        assert_eq!(query.from, Some(2));
        assert!(query.is_article());
    }

    #[test]
    fn index_aliases_and_invalid_values() {
        assert_eq!(parse_query("idx=4").article, ArticleLookup::ByIndex(4));
        assert_eq!(parse_query("index=0").article, ArticleLookup::ByIndex(0));
        assert_eq!(parse_query("i=-1").article, ArticleLookup::Invalid);
        assert_eq!(parse_query("").article, ArticleLookup::Missing);
    }

    #[test]
    fn id_lookup_falls_back_to_link() {
        let items = vec![
            NewsItem::new("a", "https://a.test/1", None),
            NewsItem::new("b", "https://a.test/2", None),
        ];
        let lookup = ArticleLookup::ById {
            id: Some("missing".to_string()),
            link: Some("https://a.test/2".to_string()),
        };
        assert_eq!(resolve_article(&items, &lookup), Resolved::Found(1));
        assert_eq!(
            resolve_article(&items, &ArticleLookup::ByIndex(2)),
            Resolved::NotFound(NotFoundReason::IndexOutOfRange)
        );
        assert_eq!(
            resolve_article(&[], &ArticleLookup::ByIndex(0)),
            Resolved::NotFound(NotFoundReason::EmptyFeed)
        );
    }
}
