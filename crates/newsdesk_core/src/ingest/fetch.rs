//! HTTP transport for feed documents.

use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/124.0 Safari/537.36";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug)]
pub enum FetchError {
    /// Client could not be constructed.
    Client(reqwest::Error),
    Transport { url: String, source: reqwest::Error },
    Status { url: String, status: u16 },
    Io { path: String, source: std::io::Error },
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client(err) => write!(f, "failed to build http client: {err}"),
            Self::Transport { url, source } => write!(f, "request to `{url}` failed: {source}"),
            Self::Status { url, status } => write!(f, "`{url}` returned http {status}"),
            Self::Io { path, source } => write!(f, "failed to read `{path}`: {source}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Client(err) => Some(err),
            Self::Transport { source, .. } => Some(source),
            Self::Status { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Retrieves raw documents by URL.
///
/// The seam that lets collection and feed loading run without network.
pub trait FeedFetcher {
    fn fetch(&self, url: &str) -> FetchResult<Vec<u8>>;
}

/// Blocking reqwest client with a browser user agent.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> FetchResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        let started_at = Instant::now();
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "*/*")
            .send()
            .map_err(|source| {
                error!(
                    "event=http_fetch module=ingest status=error duration_ms={} url={} error={}",
                    started_at.elapsed().as_millis(),
                    url,
                    source
                );
                FetchError::Transport {
                    url: url.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "event=http_fetch module=ingest status=error duration_ms={} url={} http_status={}",
                started_at.elapsed().as_millis(),
                url,
                status.as_u16()
            );
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        info!(
            "event=http_fetch module=ingest status=ok duration_ms={} url={} bytes={}",
            started_at.elapsed().as_millis(),
            url,
            body.len()
        );
        Ok(body.to_vec())
    }
}
