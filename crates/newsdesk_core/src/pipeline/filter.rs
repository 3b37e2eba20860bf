//! Exclusion rules applied to freshly collected items.

use crate::model::item::NewsItem;
use crate::normalize::text::strip_tags;
use chrono::{DateTime, Duration, Utc};
use regex::{Regex, RegexBuilder};

/// Whole-word keyword matcher over title and summary.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    patterns: Vec<Regex>,
}

impl KeywordFilter {
    /// Builds word-boundary matchers; blank keywords are ignored.
    pub fn new(keywords: &[String]) -> Self {
        let patterns = keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .filter_map(|keyword| {
                RegexBuilder::new(&format!(r"\b{}\b", regex::escape(keyword)))
                    .case_insensitive(true)
                    .build()
                    .ok()
            })
            .collect();
        Self { patterns }
    }

    /// Whether the item mentions an excluded keyword.
    pub fn should_exclude(&self, item: &NewsItem) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let text = strip_tags(&format!("{} {}", item.title, item.summary));
        self.patterns.iter().any(|pattern| pattern.is_match(&text))
    }
}

/// Whether a dated item is older than `days_back` days. Undated items and
/// `days_back == 0` never count as too old.
pub fn is_too_old(item: &NewsItem, now: DateTime<Utc>, days_back: u32) -> bool {
    if days_back == 0 {
        return false;
    }
    match item.published_at {
        Some(at) => now
            .checked_sub_signed(Duration::days(i64::from(days_back)))
            .is_some_and(|cutoff| at < cutoff),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_too_old, KeywordFilter};
    use crate::model::item::NewsItem;
    use chrono::{Duration, Utc};

    #[test]
    fn keywords_match_whole_words_only() {
        let filter = KeywordFilter::new(&["реклама".to_string(), " ".to_string()]);
        let mut ad = NewsItem::new("Это Реклама партнёра", "", None);
        ad.summary = String::new();
        let partial = NewsItem::new("Рекламации по рамам", "", None);
        assert!(filter.should_exclude(&ad));
        assert!(!filter.should_exclude(&partial));
    }

    #[test]
    fn age_filter_keeps_undated_items() {
        let now = Utc::now();
        let old = NewsItem::new("old", "", Some(now - Duration::days(40)));
        let fresh = NewsItem::new("fresh", "", Some(now - Duration::days(1)));
        let undated = NewsItem::new("undated", "", None);
        assert!(is_too_old(&old, now, 30));
        assert!(!is_too_old(&fresh, now, 30));
        assert!(!is_too_old(&undated, now, 30));
        assert!(!is_too_old(&old, now, 0));
        assert!(!is_too_old(&old, now, u32::MAX));
    }
}
