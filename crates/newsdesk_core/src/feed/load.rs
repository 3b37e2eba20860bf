//! Feed loading with fallback locations.

use crate::ingest::fetch::{FeedFetcher, FetchError};
use crate::model::item::NewsItem;
use crate::normalize::fields::normalize_feed;
use log::{info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type LoadResult<T> = Result<T, LoadError>;

/// Failure of one attempted location.
#[derive(Debug)]
pub enum AttemptError {
    Fetch(FetchError),
    Json(serde_json::Error),
}

impl Display for AttemptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid json: {err}"),
        }
    }
}

#[derive(Debug)]
pub enum LoadError {
    NoLocations,
    /// Every location failed; attempts are listed in order.
    AllFailed(Vec<(String, AttemptError)>),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLocations => write!(f, "no feed locations configured"),
            Self::AllFailed(attempts) => {
                write!(f, "no feed found in fallbacks:")?;
                for (location, err) in attempts {
                    write!(f, " [{location}: {err}]")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for LoadError {}

/// Whether a location is fetched over HTTP rather than read from disk.
pub fn is_remote(location: &str) -> bool {
    let lowered = location.trim().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

fn read_location<F: FeedFetcher + ?Sized>(
    location: &str,
    fetcher: &F,
) -> Result<Value, AttemptError> {
    let bytes = if is_remote(location) {
        fetcher.fetch(location).map_err(AttemptError::Fetch)?
    } else {
        std::fs::read(Path::new(location)).map_err(|source| {
            AttemptError::Fetch(FetchError::Io {
                path: location.to_string(),
                source,
            })
        })?
    };
    serde_json::from_slice(&bytes).map_err(AttemptError::Json)
}

/// Returns the raw document from the first location that yields JSON.
pub fn load_feed_value<F: FeedFetcher + ?Sized>(
    locations: &[String],
    fetcher: &F,
) -> LoadResult<(String, Value)> {
    if locations.is_empty() {
        return Err(LoadError::NoLocations);
    }
    let mut attempts = Vec::new();
    for location in locations {
        match read_location(location, fetcher) {
            Ok(value) => {
                info!("event=feed_load module=feed status=ok location={location}");
                return Ok((location.clone(), value));
            }
            Err(err) => {
                warn!(
                    "event=feed_load module=feed status=error location={location} error={err}"
                );
                attempts.push((location.clone(), err));
            }
        }
    }
    Err(LoadError::AllFailed(attempts))
}

/// Loads and normalizes the feed from the first working location.
pub fn load_feed<F: FeedFetcher + ?Sized>(
    locations: &[String],
    fetcher: &F,
) -> LoadResult<Vec<NewsItem>> {
    let (_, value) = load_feed_value(locations, fetcher)?;
    Ok(normalize_feed(&value))
}
