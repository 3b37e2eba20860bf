//! Text cleanup helpers shared by ingestion, classification and views.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid entity regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?s).*?[.!?](\s|$)").expect("valid sentence regex"));

/// Stems used to auto-tag aggregated items.
const KEYWORD_STEMS: &[&str] = &[
    "цистерн",
    "рама",
    "подвеск",
    "крепёж",
    "рынок",
    "дилер",
    "двигател",
    "тягач",
    "экспо",
    "выставк",
];

/// Decodes HTML entities and collapses whitespace.
pub fn norm_text(value: &str) -> String {
    let decoded = decode_entities(value);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Removes markup and returns normalized plain text.
pub fn strip_tags(value: &str) -> String {
    norm_text(&TAG_RE.replace_all(value, " "))
}

/// Decodes named and numeric HTML entities; unknown names are kept.
pub fn decode_entities(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let body = &caps[1];
            decode_entity(body).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(hex) = body
        .strip_prefix("#x")
        .or_else(|| body.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "laquo" => "«",
        "raquo" => "»",
        "mdash" => "—",
        "ndash" => "–",
        "hellip" => "…",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Returns the first sentence of `text` after whitespace normalization.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or the end.
/// Text without a terminator is returned whole.
pub fn summarize_one_sentence(text: &str) -> String {
    let normalized = WHITESPACE_RE
        .replace_all(&text.replace('\u{00A0}', " "), " ")
        .trim()
        .to_string();
    if normalized.is_empty() {
        return normalized;
    }
    match SENTENCE_RE.find(&normalized) {
        Some(found) => found.as_str().trim().to_string(),
        None => normalized,
    }
}

/// Returns the keyword stems found in `text`, in stem-list order.
pub fn keyword_tags(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    KEYWORD_STEMS
        .iter()
        .filter(|stem| lowered.contains(*stem))
        .map(|stem| stem.to_string())
        .collect()
}

/// Truncates to `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}
