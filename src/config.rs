//! Crawler configuration.
//!
//! Everything the crawl step treats as a constant (store endpoint, source
//! tag, domain pattern, selectors) lives in [`CrawlConfig`]. Defaults target
//! CNA and a store on `localhost:8000`; a YAML file can override any subset:
//!
//! ```yaml
//! api_base_url: http://store.internal:8000
//! meridian: twenty_four_hour
//! selectors:
//!   body:
//!     - .text-long > p
//!     - .text-long
//! ```

use crate::date::MeridianPolicy;
use crate::error::ConfigError;
use crate::page::parse_selector;
use crate::validate::{DEFAULT_DOMAIN_PATTERN, UrlValidator};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Base URL of the article store, without a trailing slash.
    pub api_base_url: String,
    /// Source tag used when asking the store for work.
    pub source: String,
    /// Page opened before the first invocation.
    pub start_url: String,
    /// Regex a page location must match to be crawled.
    pub domain_pattern: String,
    pub meridian: MeridianPolicy,
    /// HTTP timeout for page loads, in seconds.
    pub page_timeout_secs: u64,
    pub selectors: Selectors,
}

/// CSS selectors for the CNA article layout.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Selectors {
    pub publish_date: String,
    /// Presence alone marks the link as dead.
    pub not_found: String,
    /// Tried in order; the first selector with any match wins.
    pub body: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            source: "cna".to_string(),
            start_url: "https://www.channelnewsasia.com".to_string(),
            domain_pattern: DEFAULT_DOMAIN_PATTERN.to_string(),
            meridian: MeridianPolicy::default(),
            page_timeout_secs: 30,
            selectors: Selectors::default(),
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            publish_date: ".article-publish".to_string(),
            not_found: r#"[about="/page-not-found"]"#.to_string(),
            body: vec![
                ".text-long > p".to_string(),
                ".text-long > div > p".to_string(),
                ".text-long".to_string(),
            ],
        }
    }
}

impl CrawlConfig {
    /// Read a YAML config file. Missing keys fall back to the defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the YAML file
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Yaml`]
    /// if it does not deserialize.
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: CrawlConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_string(),
            source,
        })?;
        info!(path, "Loaded crawl configuration");
        Ok(config)
    }

    /// Check every pattern and selector compiles, returning the URL validator.
    ///
    /// # Returns
    ///
    /// The [`UrlValidator`] for `domain_pattern`, or the first
    /// [`ConfigError`] found. An empty body selector list is rejected.
    pub fn validate(&self) -> Result<UrlValidator, ConfigError> {
        if self.selectors.body.is_empty() {
            return Err(ConfigError::NoBodySelectors);
        }
        parse_selector(&self.selectors.publish_date)?;
        parse_selector(&self.selectors.not_found)?;
        for selector in &self.selectors.body {
            parse_selector(selector)?;
        }
        UrlValidator::new(&self.domain_pattern)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_validate() {
        let config = CrawlConfig::default();
        let validator = config.validate().unwrap();
        assert!(validator.is_valid("https://www.channelnewsasia.com/a/1"));
        assert_eq!(config.selectors.body.len(), 3);
        assert_eq!(config.meridian, MeridianPolicy::Discard);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_base_url: http://store.internal:9000\nmeridian: twenty_four_hour\nselectors:\n  body:\n    - article p"
        )
        .unwrap();

        let config = CrawlConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.api_base_url, "http://store.internal:9000");
        assert_eq!(config.source, "cna");
        assert_eq!(config.meridian, MeridianPolicy::TwentyFourHour);
        assert_eq!(config.selectors.body, vec!["article p".to_string()]);
        assert_eq!(config.selectors.publish_date, ".article-publish");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CrawlConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_yaml_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "selectors: [unterminated").unwrap();
        let err = CrawlConfig::load(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_selector_and_empty_chain() {
        let mut config = CrawlConfig::default();
        config.selectors.publish_date = "div[".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Selector(_))));

        let mut config = CrawlConfig::default();
        config.selectors.body.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoBodySelectors)));
    }
}
