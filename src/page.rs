//! The rendering environment, seen through two small capabilities.
//!
//! - [`Dom`]: read-only access to the current page (location, the URL the
//!   navigation was requested for, and text content by CSS selector).
//! - [`Page`]: a [`Dom`] that can also navigate.
//!
//! [`Document`] is a parsed snapshot and backs every implementation here.
//! [`LivePage`] loads documents over HTTP with `reqwest`, following
//! redirects the way a browser tab would, and records both the requested and
//! the final URL so the crawler can tell "redirected from the article" apart
//! from "somewhere else entirely".

use crate::error::PageError;
use reqwest::{Client, redirect::Policy};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const USER_AGENT: &str = concat!("cna_text_extractor/", env!("CARGO_PKG_VERSION"));

/// Read-only view of the current page.
pub trait Dom {
    /// Where the page actually is (after any redirects).
    fn location(&self) -> &str;

    /// The URL that was asked for when this page was loaded, if any.
    fn requested_url(&self) -> Option<&str>;

    /// Text content of every element matching `selector`, in document order.
    fn select_texts(&self, selector: &str) -> Result<Vec<String>, PageError>;

    /// Text content of the first matching element.
    fn first_text(&self, selector: &str) -> Result<Option<String>, PageError> {
        Ok(self.select_texts(selector)?.into_iter().next())
    }

    /// Whether at least one element matches, regardless of its content.
    fn exists(&self, selector: &str) -> Result<bool, PageError> {
        Ok(!self.select_texts(selector)?.is_empty())
    }
}

/// A [`Dom`] that can be moved to another URL.
pub trait Page: Dom {
    async fn navigate(&mut self, url: &str) -> Result<(), PageError>;
}

/// Compile a CSS selector, mapping the parser's error into [`PageError`].
pub fn parse_selector(selector: &str) -> Result<Selector, PageError> {
    Selector::parse(selector).map_err(|e| PageError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Compare two URLs after parsing, so `https://host` equals `https://host/`.
pub fn same_url(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Whether `page` is showing `link`, either directly or as the target of a
/// navigation that was redirected.
pub fn is_at(page: &impl Dom, link: &str) -> bool {
    same_url(page.location(), link) || page.requested_url().is_some_and(|r| same_url(r, link))
}

/// A parsed HTML document and where it came from.
pub struct Document {
    location: String,
    requested_url: Option<String>,
    html: Html,
}

impl Document {
    pub fn parse(location: impl Into<String>, html: &str) -> Self {
        Self {
            location: location.into(),
            requested_url: None,
            html: Html::parse_document(html),
        }
    }

    /// Record the URL this document was requested as, before redirects.
    pub fn requested_as(mut self, url: impl Into<String>) -> Self {
        self.requested_url = Some(url.into());
        self
    }

    pub fn blank() -> Self {
        Self {
            location: "about:blank".to_string(),
            requested_url: None,
            html: Html::new_document(),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("location", &self.location)
            .field("requested_url", &self.requested_url)
            .finish_non_exhaustive()
    }
}

impl Dom for Document {
    fn location(&self) -> &str {
        &self.location
    }

    fn requested_url(&self) -> Option<&str> {
        self.requested_url.as_deref()
    }

    fn select_texts(&self, selector: &str) -> Result<Vec<String>, PageError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .html
            .select(&selector)
            .map(|el| el.text().collect::<String>())
            .collect())
    }
}

/// A browser-like page that loads documents over HTTP.
#[derive(Debug)]
pub struct LivePage {
    client: Client,
    document: Document,
}

impl LivePage {
    /// Build a page with a fresh HTTP client, sitting on `about:blank`.
    ///
    /// Redirects are followed (up to 10) so the final location can be
    /// checked against the domain pattern.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Limit for a whole page load, body included
    ///
    /// # Errors
    ///
    /// [`PageError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, PageError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(10))
            .timeout(timeout)
            .build()
            .map_err(|e| PageError::Client(e.to_string()))?;

        Ok(Self {
            client,
            document: Document::blank(),
        })
    }
}

impl Dom for LivePage {
    fn location(&self) -> &str {
        self.document.location()
    }

    fn requested_url(&self) -> Option<&str> {
        self.document.requested_url()
    }

    fn select_texts(&self, selector: &str) -> Result<Vec<String>, PageError> {
        self.document.select_texts(selector)
    }
}

impl Page for LivePage {
    /// Load `url`. Error statuses still produce a page: CNA serves its
    /// not-found marker on a 404, and the crawler needs to see it.
    #[instrument(level = "info", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        let failed = |e: reqwest::Error| PageError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = self.client.get(url).send().await.map_err(failed)?;
        let status = resp.status();
        let location = resp.url().to_string();
        let body = resp.text().await.map_err(failed)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), %location, "Page loaded with error status");
        }
        if !same_url(&location, url) {
            info!(%location, "Navigation was redirected");
        }
        debug!(bytes = body.len(), "Page body received");

        self.document = Document::parse(location, &body).requested_as(url);
        Ok(())
    }
}
