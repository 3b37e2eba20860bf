//! Href construction for list and article pages.

use crate::model::item::{fnv1a_hex, NewsItem};
use reqwest::Url;

/// Link scheme used by rendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    /// `index.html?page=N`, `article.html?id=..&u=..&from=N`.
    Query,
    /// `page/N.html`, `article/<id>.html` for prebuilt sites.
    Static,
}

/// Link builder bound to the location of the page being rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    pub style: LinkStyle,
    /// Relative prefix from the current page to the site root.
    root: String,
}

impl Links {
    pub fn query() -> Self {
        Self {
            style: LinkStyle::Query,
            root: String::new(),
        }
    }

    /// Static links for a page `depth` directories below the site root.
    pub fn static_at_depth(depth: usize) -> Self {
        Self {
            style: LinkStyle::Static,
            root: "../".repeat(depth),
        }
    }

    pub fn home(&self) -> String {
        format!("{}index.html", self.root)
    }

    pub fn list_page(&self, page: usize) -> String {
        if page <= 1 {
            return self.home();
        }
        match self.style {
            LinkStyle::Query => format!("{}index.html?page={page}", self.root),
            LinkStyle::Static => format!("{}page/{page}.html", self.root),
        }
    }

    /// Article href; `from` is the list page the reader came from.
    pub fn article(&self, item: &NewsItem, from: Option<usize>) -> String {
        match self.style {
            LinkStyle::Query => {
                let mut pairs = vec![("id", item.id.to_string()), ("u", item.link.clone())];
                if let Some(page) = from {
                    pairs.push(("from", page.to_string()));
                }
                format!("{}article.html?{}", self.root, encode_query(&pairs))
            }
            LinkStyle::Static => {
                format!("{}article/{}.html", self.root, file_slug(item.id.as_str()))
            }
        }
    }
}

/// File-name-safe form of an item id.
///
/// Ids made of lowercase ASCII letters, digits, `-` and `_` are used as is.
/// Anything else is lowercased, has other characters replaced by `_` and
/// gets a hash of the original id appended, so distinct ids do not share a
/// file, even on case-insensitive file systems.
pub fn file_slug(id: &str) -> String {
    let is_plain = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_';
    if !id.is_empty() && id.chars().all(is_plain) {
        return id.to_string();
    }
    let slug: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{slug}-{}", fnv1a_hex(id))
}

/// Form-encodes key/value pairs.
pub fn encode_query(pairs: &[(&str, String)]) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return String::new();
    };
    {
        let mut serializer = url.query_pairs_mut();
        for (key, value) in pairs {
            serializer.append_pair(key, value);
        }
    }
    url.query().unwrap_or_default().to_string()
}
