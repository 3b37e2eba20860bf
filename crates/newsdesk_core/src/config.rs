//! YAML configuration for the aggregator, archive and site renderer.
//!
//! # Responsibility
//! - Load `newsdesk.yml` into typed settings with serde defaults.
//! - Validate values that would otherwise fail deep inside the pipeline.
//!
//! # Invariants
//! - A missing section falls back to defaults; unknown keys are ignored.
//! - Classifier patterns are validated at load time.

use regex::RegexBuilder;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

pub const MAX_PER_PAGE: usize = 100;
pub const MAX_PAGER_SPAN: usize = 10;
pub const MAX_RELATED_LIMIT: usize = 24;
pub const MAX_DAYS_BACK: u32 = 3650;
const MAX_UTC_OFFSET_MINUTES: u32 = 18 * 60;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Yaml(serde_yaml::Error),
    InvalidPattern { category: String, pattern: String, message: String },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Yaml(err) => write!(f, "invalid config yaml: {err}"),
            Self::InvalidPattern {
                category,
                pattern,
                message,
            } => write!(
                f,
                "invalid classify pattern `{pattern}` for `{category}`: {message}"
            ),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Yaml(err) => Some(err),
            Self::InvalidPattern { .. } | Self::Invalid(_) => None,
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

/// One RSS/Atom source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_name")]
    pub name: String,
    #[serde(default, alias = "link")]
    pub url: String,
}

/// Category -> regex patterns, evaluated in file order.
///
/// Stored as pairs because a map would lose the order that decides which
/// category wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyRules(pub Vec<(String, Vec<String>)>);

impl Serialize for ClassifyRules {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, patterns) in &self.0 {
            map.serialize_entry(category, patterns)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClassifyRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = ClassifyRules;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str("a mapping of category names to pattern lists")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(ClassifyRules::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut rules = Vec::new();
                while let Some((category, patterns)) =
                    access.next_entry::<String, Vec<String>>()?
                {
                    rules.push((category, patterns));
                }
                Ok(ClassifyRules(rules))
            }
        }

        deserializer.deserialize_any(RulesVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeRules {
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Cap on the merged feed size.
    pub global_limit: usize,
    /// Entries taken from a single source per run.
    pub per_feed_limit: usize,
    /// Fresh entries older than this are dropped. `0` disables the check.
    pub days_back: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            global_limit: 5000,
            per_feed_limit: 120,
            days_back: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub per_page: usize,
    pub pager_span: usize,
    pub related_limit: usize,
    /// Offset applied when formatting dates for readers.
    pub utc_offset_minutes: i32,
    /// Feed locations tried in order: file paths or http(s) URLs.
    pub feed_locations: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Новости".to_string(),
            per_page: crate::browse::page::DEFAULT_PER_PAGE,
            pager_span: crate::browse::page::DEFAULT_PAGER_SPAN,
            related_limit: crate::browse::related::DEFAULT_RELATED_LIMIT,
            utc_offset_minutes: 0,
            feed_locations: vec![
                "data/news.json".to_string(),
                "frontend/data/news.json".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub feed_path: PathBuf,
    pub meta_path: PathBuf,
    /// Optional SQLite archive updated on every collect run.
    pub db_path: Option<PathBuf>,
    pub site_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            feed_path: PathBuf::from("frontend/data/news.json"),
            meta_path: PathBuf::from("frontend/data/news_meta.json"),
            db_path: None,
            site_dir: PathBuf::from("public"),
        }
    }
}

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsdeskConfig {
    pub sources: Vec<SourceConfig>,
    pub classify: ClassifyRules,
    pub exclude: ExcludeRules,
    pub blocked_domains: BTreeSet<String>,
    pub limits: Limits,
    pub site: SiteConfig,
    pub output: OutputConfig,
}

impl Default for NewsdeskConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            classify: ClassifyRules::default(),
            exclude: ExcludeRules::default(),
            blocked_domains: ["tass.ru", "www.tass.ru"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            limits: Limits::default(),
            site: SiteConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl NewsdeskConfig {
    /// Parses and validates YAML text.
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Checks limits and compiles classifier patterns once.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.limits.global_limit == 0 {
            return Err(ConfigError::Invalid(
                "limits.global_limit must be positive".to_string(),
            ));
        }
        if self.limits.per_feed_limit == 0 {
            return Err(ConfigError::Invalid(
                "limits.per_feed_limit must be positive".to_string(),
            ));
        }
        if self.limits.days_back > MAX_DAYS_BACK {
            return Err(ConfigError::Invalid(format!(
                "limits.days_back must be at most {MAX_DAYS_BACK}"
            )));
        }
        if self.site.per_page > MAX_PER_PAGE {
            return Err(ConfigError::Invalid(format!(
                "site.per_page must be at most {MAX_PER_PAGE}"
            )));
        }
        if self.site.pager_span > MAX_PAGER_SPAN {
            return Err(ConfigError::Invalid(format!(
                "site.pager_span must be at most {MAX_PAGER_SPAN}"
            )));
        }
        if self.site.related_limit > MAX_RELATED_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "site.related_limit must be at most {MAX_RELATED_LIMIT}"
            )));
        }
        if self.site.utc_offset_minutes.unsigned_abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(
                "site.utc_offset_minutes must be within ±18 hours".to_string(),
            ));
        }
        for (category, patterns) in &self.classify.0 {
            for pattern in patterns {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| ConfigError::InvalidPattern {
                        category: category.clone(),
                        pattern: pattern.clone(),
                        message: err.to_string(),
                    })?;
            }
        }
        Ok(())
    }

    /// Whether `domain` is on the block list (case-insensitive).
    pub fn is_blocked(&self, domain: &str) -> bool {
        let lowered = domain.trim().to_lowercase();
        self.blocked_domains
            .iter()
            .any(|blocked| blocked.to_lowercase() == lowered)
    }
}

fn default_source_name() -> String {
    "source".to_string()
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, NewsdeskConfig};

    #[test]
    fn empty_document_yields_defaults() {
        let config = NewsdeskConfig::from_yaml_str("").unwrap();
        assert_eq!(config.limits.global_limit, 5000);
        assert_eq!(config.site.per_page, 24);
        assert!(config.is_blocked("TASS.ru"));
    }

    #[test]
    fn classify_keeps_file_order() {
        let config = NewsdeskConfig::from_yaml_str(
            r#"
classify:
  "Выставки": ["выставк"]
  "Новые модели": ["премьера"]
sources:
  - name: Example
    link: https://example.com/rss
"#,
        )
        .unwrap();
        let categories: Vec<&str> = config
            .classify
            .0
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(categories, vec!["Выставки", "Новые модели"]);
        assert_eq!(config.sources[0].url, "https://example.com/rss");
    }

    #[test]
    fn out_of_range_limits_are_rejected() {
        for yaml in [
            "site:\n  pager_span: 18446744073709551615\n",
            "site:\n  related_limit: 1000000\n",
            "site:\n  per_page: 5000\n",
            "site:\n  utc_offset_minutes: -2000\n",
            "limits:\n  days_back: 4294967295\n",
        ] {
            let err = NewsdeskConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{yaml}");
        }
        let edge = NewsdeskConfig::from_yaml_str("site:\n  pager_span: 10\n  related_limit: 24\n");
        assert!(edge.is_ok());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = NewsdeskConfig::from_yaml_str("classify:\n  Bad: [\"(\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
