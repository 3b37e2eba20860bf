//! Escaping, body rendering and date formatting primitives.

use crate::render::sanitize::sanitize_html;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?[a-z][^>]*>").expect("valid html detection regex"));
static PARAGRAPH_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").expect("valid paragraph regex"));

/// Escapes text for element content and quoted attribute values.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Whether the body already contains markup.
pub fn looks_like_html(value: &str) -> bool {
    HTML_TAG_RE.is_match(value)
}

/// Renders an article body: sanitized HTML, or escaped paragraphs.
pub fn render_body(body: &str) -> String {
    if looks_like_html(body) {
        return sanitize_html(body);
    }
    let paragraphs: Vec<String> = PARAGRAPH_BREAK_RE
        .split(body.trim())
        .filter(|paragraph| !paragraph.trim().is_empty())
        .map(|paragraph| format!("<p>{}</p>", escape_html(paragraph.trim())))
        .collect();
    paragraphs.join("\n")
}

/// Wraps rendered content into a complete HTML document.
pub fn document(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"ru\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_html(title)
    )
}

fn with_offset(value: DateTime<Utc>, offset_minutes: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_minutes.saturating_mul(60))
        .unwrap_or_else(|| Utc.fix());
    value.with_timezone(&offset)
}

/// `dd.mm.yyyy, HH:MM` in the configured offset.
pub fn format_datetime(value: Option<DateTime<Utc>>, offset_minutes: i32) -> String {
    value
        .map(|dt| {
            with_offset(dt, offset_minutes)
                .format("%d.%m.%Y, %H:%M")
                .to_string()
        })
        .unwrap_or_default()
}

/// `dd.mm.yyyy` in the configured offset.
pub fn format_date(value: Option<DateTime<Utc>>, offset_minutes: i32) -> String {
    value
        .map(|dt| with_offset(dt, offset_minutes).format("%d.%m.%Y").to_string())
        .unwrap_or_default()
}
