//! Client for the remote article store.
//!
//! The store exposes three endpoints:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `GET` | `/article/getArticleByText?text=&source=<tag>` | next unprocessed record |
//! | `POST` | `/article/{id}` | overwrite the whole record |
//! | `DELETE` | `/article/{id}` | remove the record |
//!
//! Locking is not a separate endpoint: [`ArticleQueue::set_lock`] flips
//! `isProcessing` on the working copy and overwrites the record. None of the
//! calls retry; the crawler decides what a failure means.

use crate::error::QueueError;
use crate::models::{Article, FetchEnvelope};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Operations the crawler needs from the article store.
pub trait ArticleQueue {
    /// Next record for this source whose `text` is still empty.
    async fn fetch_next(&self) -> Result<Option<Article>, QueueError>;

    /// Overwrite the stored record with `article`.
    async fn persist(&self, article: &Article) -> Result<(), QueueError>;

    /// Remove the record permanently.
    async fn delete(&self, article: &Article) -> Result<(), QueueError>;

    /// Set or clear the advisory lock and write the record back.
    async fn set_lock(&self, article: &mut Article, locked: bool) -> Result<(), QueueError> {
        article.set_processing(locked);
        self.persist(article).await
    }
}

/// [`ArticleQueue`] over the store's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpQueueClient {
    http: Client,
    base_url: String,
    source: String,
}

impl HttpQueueClient {
    /// Create a client for the store at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the store API; a trailing slash is dropped
    /// * `source` - Source tag sent when asking for the next record (`cna`)
    ///
    /// # Errors
    ///
    /// [`QueueError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, source: &str) -> Result<Self, QueueError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            source: source.to_string(),
        })
    }

    fn article_url(&self, article: &Article) -> String {
        format!(
            "{}/article/{}",
            self.base_url,
            urlencoding::encode(&article.id)
        )
    }
}

/// Turn a non-2xx response into [`QueueError::Api`].
fn check_status(resp: Response) -> Result<Response, QueueError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(QueueError::Api {
            status: status.as_u16(),
            url: resp.url().to_string(),
        })
    }
}

impl ArticleQueue for HttpQueueClient {
    #[instrument(level = "info", skip(self), fields(source = %self.source))]
    async fn fetch_next(&self) -> Result<Option<Article>, QueueError> {
        let url = format!("{}/article/getArticleByText", self.base_url);
        let result = async {
            let resp = self
                .http
                .get(&url)
                .query(&[("text", ""), ("source", self.source.as_str())])
                .send()
                .await?;
            let envelope: FetchEnvelope = check_status(resp)?.json().await?;
            Ok::<_, QueueError>(envelope.into_article())
        }
        .await;

        match &result {
            Ok(Some(article)) => debug!(article_id = %article.id, link = %article.link, "Fetched unprocessed article"),
            Ok(None) => info!("No unprocessed articles found"),
            Err(e) => error!(error = %e, "Failed to get unprocessed article"),
        }
        result
    }

    #[instrument(level = "info", skip_all, fields(article_id = %article.id))]
    async fn persist(&self, article: &Article) -> Result<(), QueueError> {
        let url = self.article_url(article);
        let result = async {
            let resp = self.http.post(&url).json(article).send().await?;
            check_status(resp)?;
            Ok::<_, QueueError>(())
        }
        .await;

        if let Err(e) = &result {
            error!(error = %e, locked = article.is_locked(), "Failed to update article");
        }
        result
    }

    #[instrument(level = "info", skip_all, fields(article_id = %article.id))]
    async fn delete(&self, article: &Article) -> Result<(), QueueError> {
        let url = self.article_url(article);
        let result = async {
            let resp = self.http.delete(&url).send().await?;
            check_status(resp)?;
            Ok::<_, QueueError>(())
        }
        .await;

        match &result {
            Ok(()) => info!(link = %article.link, "Deleted article"),
            Err(e) => error!(error = %e, "Failed to delete article"),
        }
        result
    }
}
