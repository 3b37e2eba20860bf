//! Multi-source collection.

use crate::config::SourceConfig;
use crate::ingest::fetch::FeedFetcher;
use crate::ingest::rss::parse_feed;
use crate::model::item::NewsItem;
use log::{error, info, warn};

/// Per-source outcome of a collect run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    /// Items taken from this source.
    pub collected: usize,
    /// Failure description when the source was skipped.
    pub error: Option<String>,
}

/// Fetches and parses every source, keeping at most `per_feed_limit`
/// entries from each.
///
/// Sources with an empty URL, a transport failure or a malformed document
/// are reported and skipped.
pub fn collect<F: FeedFetcher + ?Sized>(
    sources: &[SourceConfig],
    fetcher: &F,
    per_feed_limit: usize,
) -> (Vec<NewsItem>, Vec<SourceReport>) {
    let mut items = Vec::new();
    let mut reports = Vec::with_capacity(sources.len());

    for source in sources {
        let url = source.url.trim();
        if url.is_empty() {
            warn!(
                "event=source_collect module=ingest status=error source={} error_code=empty_url",
                source.name
            );
            reports.push(SourceReport {
                name: source.name.clone(),
                collected: 0,
                error: Some("empty url".to_string()),
            });
            continue;
        }

        let parsed = fetcher
            .fetch(url)
            .map_err(|err| err.to_string())
            .and_then(|bytes| parse_feed(&bytes).map_err(|err| err.to_string()));

        match parsed {
            Ok(entries) => {
                if entries.is_empty() {
                    warn!(
                        "event=source_collect module=ingest status=ok source={} collected=0 note=entries_empty",
                        source.name
                    );
                }
                let before = items.len();
                items.extend(
                    entries
                        .into_iter()
                        .take(per_feed_limit)
                        .map(|entry| entry.into_item(&source.name)),
                );
                let collected = items.len() - before;
                info!(
                    "event=source_collect module=ingest status=ok source={} collected={}",
                    source.name, collected
                );
                reports.push(SourceReport {
                    name: source.name.clone(),
                    collected,
                    error: None,
                });
            }
            Err(message) => {
                error!(
                    "event=source_collect module=ingest status=error source={} error={}",
                    source.name, message
                );
                reports.push(SourceReport {
                    name: source.name.clone(),
                    collected: 0,
                    error: Some(message),
                });
            }
        }
    }

    (items, reports)
}
