//! Feed ingestion: HTTP fetching and RSS/Atom parsing.
//!
//! # Responsibility
//! - Download source documents behind the `FeedFetcher` seam.
//! - Parse RSS 2.0 and Atom entries into canonical items.
//! - Collect all configured sources, isolating per-source failures.
//!
//! # Invariants
//! - One failing source never aborts a collect run.

pub mod collect;
pub mod fetch;
pub mod rss;
