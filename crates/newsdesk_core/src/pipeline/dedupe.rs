//! Duplicate and near-duplicate removal.

use crate::model::item::NewsItem;
use crate::pipeline::canonical::{bare_host, canonical_url};
use std::collections::HashSet;

/// Width of the near-duplicate time bucket.
pub const NEAR_DUPLICATE_WINDOW_SECS: i64 = 72 * 3600;

/// Removes duplicates, keeping the first occurrence.
///
/// 1. Items whose canonical URL was already seen are dropped.
/// 2. Items with the same lowercased title on the same host inside the same
///    72-hour bucket are dropped as near duplicates.
pub fn dedupe(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<(String, String, Option<i64>)> = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        let canonical = canonical_url(&item.link);
        if !canonical.is_empty() && !seen_urls.insert(canonical.clone()) {
            continue;
        }

        let title = item.title.trim().to_lowercase();
        let host = if canonical.is_empty() {
            bare_host(&item.link)
        } else {
            bare_host(&canonical)
        };
        if !title.is_empty() && !host.is_empty() {
            let bucket = item
                .published_at
                .map(|at| at.timestamp().div_euclid(NEAR_DUPLICATE_WINDOW_SECS));
            if !seen_titles.insert((title, host, bucket)) {
                continue;
            }
        }

        kept.push(item);
    }

    kept
}

/// Removes repeats of the same id, keeping the first.
pub fn dedupe_by_id(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::dedupe;
    use crate::model::item::NewsItem;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn canonical_duplicates_are_dropped() {
        let items = vec![
            NewsItem::new("A", "https://www.site.test/a/?utm_source=rss", None),
            NewsItem::new("A copy", "https://site.test/a", None),
        ];
        let kept = dedupe(items);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "A");
    }

    #[test]
    fn same_title_same_host_within_bucket_is_near_duplicate() {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let bucket_start = at.timestamp() - at.timestamp().rem_euclid(72 * 3600);
        let start = Utc.timestamp_opt(bucket_start, 0).unwrap();
        let items = vec![
            NewsItem::new("Same Story", "https://site.test/1", Some(start)),
            NewsItem::new("same story ", "https://site.test/2", Some(start + Duration::hours(5))),
            NewsItem::new("Same Story", "https://other.test/3", Some(start)),
            NewsItem::new("Same Story", "https://site.test/4", Some(start + Duration::hours(80))),
        ];
        let kept: Vec<String> = dedupe(items).into_iter().map(|item| item.link).collect();
        assert_eq!(
            kept,
            vec![
                "https://site.test/1".to_string(),
                "https://other.test/3".to_string(),
                "https://site.test/4".to_string(),
            ]
        );
    }
}
