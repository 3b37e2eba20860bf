//! News item domain model.
//!
//! # Responsibility
//! - Define the canonical record rendered by list and article views.
//! - Derive stable identifiers for records that arrive without one.
//!
//! # Invariants
//! - `ItemId` values are lowercase hex and never empty.
//! - A derived id depends only on `link`, `title` and `published_at`.
//! - `tags` keeps first-seen order and holds no duplicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Stable identifier used in `?id=` links and archive rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wraps an externally supplied id. Blank input yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Derives the id from link, title and publication time.
    ///
    /// FNV-1a over UTF-16 code units of `link|title|epoch_millis`, so ids
    /// match the ones already published in feed links.
    pub fn derive(link: &str, title: &str, published_at: Option<DateTime<Utc>>) -> Self {
        let millis = published_at.map_or(0, |dt| dt.timestamp_millis());
        Self(fnv1a_hex(&format!("{link}|{title}|{millis}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// FNV-1a (32 bit) over UTF-16 code units, as lowercase hex.
pub fn fnv1a_hex(text: &str) -> String {
    let mut hash = FNV_OFFSET_BASIS;
    for unit in text.encode_utf16() {
        hash ^= u32::from(unit);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{hash:x}")
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical news record shared by feed export, archive and views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: ItemId,
    /// May be empty; views substitute a placeholder.
    pub title: String,
    /// Original article URL. Empty when the feed had none.
    pub link: String,
    /// Host of `link` unless the feed named it explicitly.
    pub domain: String,
    /// Human readable source name.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    /// Full body, either HTML or plain text with blank-line paragraphs.
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl NewsItem {
    /// Creates an item with a derived id and empty optional fields.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published_at: Option<DateTime<Utc>>,
    ) -> Self {
        let title = title.into();
        let link = link.into();
        let domain = host_of(&link).unwrap_or_default();
        Self {
            id: ItemId::derive(&link, &title, published_at),
            title,
            link,
            domain,
            source: String::new(),
            summary: String::new(),
            content_html: String::new(),
            image: None,
            tags: Vec::new(),
            category: None,
            published_at,
        }
    }

    /// Publication time used for ordering; undated items count as the epoch.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Source label shown on cards: explicit source, else domain.
    pub fn source_label(&self) -> &str {
        if self.source.trim().is_empty() {
            self.domain.as_str()
        } else {
            self.source.as_str()
        }
    }

    /// Appends tags, skipping blanks and case-insensitive duplicates.
    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let trimmed = tag.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let exists = self
                .tags
                .iter()
                .any(|existing| existing.to_lowercase() == trimmed.to_lowercase());
            if !exists {
                self.tags.push(trimmed.to_string());
            }
        }
    }

    /// Body to render: full content, else summary.
    pub fn body(&self) -> &str {
        if self.content_html.trim().is_empty() {
            self.summary.as_str()
        } else {
            self.content_html.as_str()
        }
    }
}

/// Newest-first comparison used by every feed ordering.
pub fn newest_first(left: &NewsItem, right: &NewsItem) -> Ordering {
    right.sort_key().cmp(&left.sort_key())
}

/// Stable newest-first sort; equal dates keep input order.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(newest_first);
}

/// Extracts the host component of an absolute URL.
pub fn host_of(link: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(link.trim()).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.to_string())
}
