//! Core of the newsdesk portal.
//!
//! Normalizes heterogeneous news feeds into one model, pages and renders
//! them, and runs the aggregation pipeline that produces the feed.

pub mod browse;
pub mod config;
pub mod db;
pub mod feed;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod repo;
pub mod search;
pub mod service;
pub mod site;

pub use browse::page::{paginate, pager, Page, PagerEntry};
pub use browse::query::{parse_query, ArticleLookup, NavQuery, NotFoundReason};
pub use config::{ConfigError, NewsdeskConfig};
pub use feed::export::{read_feed, write_feed, write_meta, ExportError};
pub use feed::load::{load_feed, LoadError};
pub use ingest::fetch::{FeedFetcher, FetchError, HttpFetcher};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::item::{ItemId, NewsItem};
pub use normalize::fields::{normalize_feed, normalize_item};
pub use pipeline::run::{run_pipeline, PipelineError, PipelineOutcome, PipelineReport};
pub use repo::news_repo::{NewsListQuery, NewsRepository, RepoError, SqliteNewsRepository};
pub use search::fts::{search_news, SearchError, SearchHit, SearchQuery};
pub use service::archive_service::{ArchiveFilter, ArchiveService};
pub use service::portal_service::{ArticleView, Portal, PortalFilter, ALL_CATEGORIES};
pub use site::{build_site, SiteReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
