//! Typed failures for every collaborator the crawler talks to.
//!
//! Each enum maps onto one branch family of the crawl state machine:
//!
//! | Error | Raised by | Crawler reaction |
//! |-------|-----------|------------------|
//! | [`QueueError`] | [`crate::queue`] | abort the cycle, never discard |
//! | [`PageError`] | [`crate::page`] | abort the cycle |
//! | [`ExtractError`] | [`crate::extract`] | discard on date failures, abort otherwise |
//! | [`ConfigError`] | [`crate::config`] | fatal at startup |

use thiserror::Error;

/// Failure talking to the remote article store.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("network error: {0}")]
    Network(String),

    #[error("store returned status {status} for {url}")]
    Api { status: u16, url: String },

    #[error("could not decode store response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for QueueError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            QueueError::Decode(err.to_string())
        } else {
            QueueError::Network(err.to_string())
        }
    }
}

/// Failure reading from or moving the page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("could not build browser client: {0}")]
    Client(String),
}

/// The raw publish date could not be turned into a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid date `{0}`")]
    InvalidDate(String),
}

/// Why content extraction did not produce a complete article.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no publish date element on page")]
    MissingDate,

    #[error(transparent)]
    InvalidDate(#[from] DateError),

    #[error("no body text found")]
    NoBodyText,

    #[error("body text is empty after normalization")]
    EmptyText,

    #[error(transparent)]
    Page(#[from] PageError),
}

/// Problems loading or validating [`crate::config::CrawlConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid domain pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Selector(#[from] PageError),

    #[error("at least one body selector is required")]
    NoBodySelectors,
}
