//! Fallback-chain mapping from raw JSON records to `NewsItem`.
//!
//! # Responsibility
//! - Resolve each canonical field from the first present candidate key.
//! - Unwrap the feed envelopes used by different exporter versions.
//!
//! # Invariants
//! - A candidate counts as present when it is neither null nor `""`.
//! - `normalize_feed` output is sorted newest first.

use crate::model::item::{host_of, sort_newest_first, ItemId, NewsItem};
use crate::normalize::date::parse_datetime_value;
use log::debug;
use serde_json::{Map, Value};

pub const ID_KEYS: &[&str] = &["_id", "id"];
pub const TITLE_KEYS: &[&str] = &["title", "headline", "name"];
pub const SUMMARY_KEYS: &[&str] = &["summary", "snippet", "lead", "description"];
pub const DATE_KEYS: &[&str] = &[
    "published_at",
    "pubDate",
    "pub_date",
    "publishedAt",
    "date",
    "datetime",
    "time",
    "created_at",
    "updated_at",
];
pub const LINK_KEYS: &[&str] = &["url", "link", "source_url"];
pub const IMAGE_KEYS: &[&str] = &["image_url", "image", "img"];
pub const SOURCE_KEYS: &[&str] = &["source_name", "source", "site"];
pub const TAG_KEYS: &[&str] = &["tags", "rubrics", "categories"];
pub const CATEGORY_KEYS: &[&str] = &["category", "rubric"];
pub const HTML_BODY_KEYS: &[&str] = &["content_html", "body_html"];
pub const TEXT_BODY_KEYS: &[&str] = &["content", "body", "text", "full_text", "article"];

const ENVELOPE_KEYS: &[&str] = &["items", "news", "data"];

/// Returns the first candidate value that is neither null nor an empty string.
pub fn get_field<'a>(obj: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|key| match obj.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) if text.is_empty() => None,
        Some(value) => Some(value),
    })
}

/// Resolves the chain like [`get_field`] and renders the winner as text.
///
/// A present non-scalar value (array, object, bool) ends the chain with
/// `None`; later candidates are not consulted.
pub fn get_text(obj: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    get_field(obj, candidates).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Returns the item array inside any supported feed envelope.
///
/// Accepts a bare array or an object keyed by `items`, `news` or `data`.
pub fn feed_entries(raw: &Value) -> &[Value] {
    match raw {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => ENVELOPE_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

/// Normalizes a whole feed document and sorts it newest first.
pub fn normalize_feed(raw: &Value) -> Vec<NewsItem> {
    let entries = feed_entries(raw);
    let mut items: Vec<NewsItem> = entries.iter().filter_map(normalize_item).collect();
    let skipped = entries.len() - items.len();
    if skipped > 0 {
        debug!("event=feed_normalize module=normalize status=ok skipped={skipped}");
    }
    sort_newest_first(&mut items);
    items
}

/// Maps one raw record onto the canonical model.
///
/// Returns `None` for non-object values.
pub fn normalize_item(raw: &Value) -> Option<NewsItem> {
    let obj = raw.as_object()?;

    let title = get_text(obj, TITLE_KEYS).map(|t| t.trim().to_string()).unwrap_or_default();
    let link = get_text(obj, LINK_KEYS).map(|l| l.trim().to_string()).unwrap_or_default();
    let published_at = get_field(obj, DATE_KEYS).and_then(parse_datetime_value);

    let id = get_text(obj, ID_KEYS)
        .and_then(|value| ItemId::parse(&value))
        .unwrap_or_else(|| ItemId::derive(&link, &title, published_at));

    let domain = get_text(obj, &["domain"])
        .or_else(|| host_of(&link))
        .unwrap_or_default();

    let content_html = get_text(obj, HTML_BODY_KEYS)
        .or_else(|| get_text(obj, TEXT_BODY_KEYS))
        .unwrap_or_default();

    let mut item = NewsItem {
        id,
        title,
        link,
        domain,
        source: source_name(obj).unwrap_or_default(),
        summary: get_text(obj, SUMMARY_KEYS).unwrap_or_default(),
        content_html,
        image: image_url(obj),
        tags: Vec::new(),
        category: get_text(obj, CATEGORY_KEYS),
        published_at,
    };
    item.add_tags(tag_list(obj));
    Some(item)
}

fn source_name(obj: &Map<String, Value>) -> Option<String> {
    SOURCE_KEYS.iter().find_map(|key| match obj.get(*key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Object(inner) => get_text(inner, &["name", "title"]),
        _ => None,
    })
}

fn image_url(obj: &Map<String, Value>) -> Option<String> {
    if let Some(url) = get_text(obj, IMAGE_KEYS) {
        return Some(url);
    }
    if let Some(Value::Object(inner)) = obj.get("image") {
        if let Some(url) = get_text(inner, &["url", "href"]) {
            return Some(url);
        }
    }
    if let Some(first) = obj
        .get("images")
        .and_then(Value::as_array)
        .and_then(|images| images.first())
    {
        let url = match first {
            Value::Object(inner) => get_text(inner, &["url", "src"]),
            other => scalar_text(other),
        };
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            return Some(url);
        }
    }
    if let Some(Value::Object(enclosure)) = obj.get("enclosure") {
        if let Some(url) = get_text(enclosure, &["url", "link"]) {
            return Some(url);
        }
    }
    get_text(obj, &["thumbnail"])
}

fn tag_list(obj: &Map<String, Value>) -> Vec<String> {
    match get_field(obj, TAG_KEYS) {
        Some(Value::Array(values)) => values.iter().filter_map(scalar_text).collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}
