//! Feed and metadata export.

use crate::model::item::NewsItem;
use crate::normalize::fields::normalize_feed;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug)]
pub enum ExportError {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error on `{}`: {source}", path.display()),
            Self::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Contents of `news_meta.json`, polled by readers to detect updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMeta {
    pub updated_at: String,
    pub count: usize,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `bytes` to `path` through a sibling temp file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let mut tmp_name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, bytes).map_err(io_error(&tmp_path))?;
    std::fs::rename(&tmp_path, path).map_err(io_error(path))?;
    Ok(())
}

/// Writes the feed as a pretty-printed JSON array.
pub fn write_feed(path: impl AsRef<Path>, items: &[NewsItem]) -> ExportResult<()> {
    let json = serde_json::to_vec_pretty(items)?;
    write_atomic(path.as_ref(), &json)
}

/// Writes `{updated_at, count}` metadata.
pub fn write_meta(
    path: impl AsRef<Path>,
    count: usize,
    now: DateTime<Utc>,
) -> ExportResult<FeedMeta> {
    let meta = FeedMeta {
        updated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        count,
    };
    let json = serde_json::to_vec_pretty(&meta)?;
    write_atomic(path.as_ref(), &json)?;
    Ok(meta)
}

/// Reads an existing feed file of any supported version.
///
/// A missing file is an empty feed.
pub fn read_feed(path: impl AsRef<Path>) -> ExportResult<Vec<NewsItem>> {
    let path = path.as_ref();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_error(path)(err)),
    };
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    Ok(normalize_feed(&value))
}
