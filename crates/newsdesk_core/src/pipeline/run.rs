//! End-to-end aggregation run.

use crate::config::{ConfigError, NewsdeskConfig};
use crate::ingest::collect::{collect, SourceReport};
use crate::ingest::fetch::FeedFetcher;
use crate::model::item::{sort_newest_first, NewsItem};
use crate::normalize::text::{keyword_tags, strip_tags};
use crate::pipeline::classify::Classifier;
use crate::pipeline::dedupe::{dedupe, dedupe_by_id};
use crate::pipeline::filter::{is_too_old, KeywordFilter};
use chrono::{DateTime, Utc};
use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug)]
pub enum PipelineError {
    Config(ConfigError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Counters describing one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub sources: Vec<SourceReport>,
    pub fresh: usize,
    pub excluded: usize,
    pub blocked: usize,
    pub too_old: usize,
    pub existing: usize,
    pub merged: usize,
    /// Most frequent domain and its count.
    pub top_domain: Option<(String, usize)>,
}

/// Result of a run: the new feed and its report.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub items: Vec<NewsItem>,
    pub report: PipelineReport,
}

/// Assigns category and keyword tags to an item that lacks them.
pub fn enrich(item: &mut NewsItem, classifier: &Classifier) {
    if item.category.is_none() {
        item.category = classifier
            .classify(&item.title, &item.summary)
            .map(str::to_string);
    }
    let text = strip_tags(&format!("{} {}", item.title, item.summary));
    item.add_tags(keyword_tags(&text));
}

/// Runs filtering and merging over already collected `fresh` items.
pub fn process(
    config: &NewsdeskConfig,
    fresh: Vec<NewsItem>,
    existing: Vec<NewsItem>,
    now: DateTime<Utc>,
) -> PipelineResult<PipelineOutcome> {
    let classifier = Classifier::new(&config.classify)?;
    let keywords = KeywordFilter::new(&config.exclude.keywords);

    let mut report = PipelineReport {
        fresh: fresh.len(),
        existing: existing.len(),
        ..PipelineReport::default()
    };

    let mut accepted = Vec::with_capacity(fresh.len());
    for mut item in fresh {
        if config.is_blocked(&item.domain) {
            report.blocked += 1;
            continue;
        }
        if keywords.should_exclude(&item) {
            report.excluded += 1;
            continue;
        }
        if is_too_old(&item, now, config.limits.days_back) {
            report.too_old += 1;
            continue;
        }
        enrich(&mut item, &classifier);
        accepted.push(item);
    }

    let existing = existing
        .into_iter()
        .filter(|item| !config.is_blocked(&item.domain));

    let mut merged = dedupe_by_id(dedupe(accepted.into_iter().chain(existing).collect()));
    sort_newest_first(&mut merged);
    merged.truncate(config.limits.global_limit);

    report.merged = merged.len();
    report.top_domain = top_domain(&merged);
    info!(
        "event=pipeline_run module=pipeline status=ok fresh={} blocked={} excluded={} too_old={} existing={} merged={}",
        report.fresh, report.blocked, report.excluded, report.too_old, report.existing, report.merged
    );

    Ok(PipelineOutcome {
        items: merged,
        report,
    })
}

/// Collects every configured source and merges the result into `existing`.
pub fn run_pipeline<F: FeedFetcher + ?Sized>(
    config: &NewsdeskConfig,
    fetcher: &F,
    existing: Vec<NewsItem>,
    now: DateTime<Utc>,
) -> PipelineResult<PipelineOutcome> {
    info!(
        "event=pipeline_run module=pipeline status=start sources={}",
        config.sources.len()
    );
    let (fresh, sources) = collect(&config.sources, fetcher, config.limits.per_feed_limit);
    let mut outcome = process(config, fresh, existing, now)?;
    outcome.report.sources = sources;
    Ok(outcome)
}

/// Most frequent non-empty domain; ties resolve to the smaller name.
pub fn top_domain(items: &[NewsItem]) -> Option<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for item in items.iter().filter(|item| !item.domain.is_empty()) {
        *counts.entry(item.domain.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|left, right| left.1.cmp(&right.1).then(right.0.cmp(left.0)))
        .map(|(domain, count)| (domain.to_string(), count))
}
