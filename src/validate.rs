//! Domain check for the page the crawler landed on.
//!
//! CNA sometimes redirects an article link to another property (lifestyle,
//! luxury, regional editions). Those pages use a different layout, so the
//! crawler only works on locations matching the configured pattern.

use crate::error::ConfigError;
use regex::Regex;

pub const DEFAULT_DOMAIN_PATTERN: &str = r"^https://www\.channelnewsasia\.com(?:[/?#]|$)";

/// Compiled domain pattern for landed page locations.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    pattern: Regex,
}

impl UrlValidator {
    /// Compile `pattern`, usually [`DEFAULT_DOMAIN_PATTERN`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::Pattern`] if the regex does not compile.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|source| ConfigError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }

    /// Whether `location` is somewhere the crawler may extract from.
    ///
    /// # Arguments
    ///
    /// * `location` - Final URL of the page, after redirects
    ///
    /// # Returns
    ///
    /// `true` when the pattern matches anywhere in `location`; anchor the
    /// pattern to restrict it to the host.
    pub fn is_valid(&self, location: &str) -> bool {
        self.pattern.is_match(location)
    }
}
