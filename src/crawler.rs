//! The per-article crawl state machine.
//!
//! One call to [`Crawler::run_cycle`] is one invocation of the crawl step:
//!
//! ```text
//! Start ─fetch─▶ HaveArticle ─at link?─▶ LocationChecked ─lock─▶ ContentChecked
//!   │                 │ no: navigate, end         │ off-domain         │ not-found marker
//!   ▼                 ▼                           ▼                    ▼
//!  Done           (re-entry)                   Discard ◀────────── Discard
//!                     │ link unreachable          ▲
//!                     └───────────────────────────┘
//!                                                 │                    ▲
//! ContentChecked ─extract─▶ Extracted ─persist─▶ Persisted ─unlock─▶ Advancing
//!        │ bad/missing date ──────────────────────┘
//!        │ no body text: abort, article stays locked
//! Discard/Advancing ─fetch next─▶ navigate toward it, end
//! ```
//!
//! Navigation always ends the invocation. The host calls `run_cycle` again
//! on the new page and the machine starts from `Start`; nothing about the
//! previous article survives in memory.

use crate::config::CrawlConfig;
use crate::error::{ExtractError, PageError};
use crate::extract::extract;
use crate::models::Article;
use crate::page::{Page, is_at};
use crate::queue::ArticleQueue;
use crate::utils::truncate_for_log;
use crate::validate::UrlValidator;
use std::fmt;
use tracing::{error, info, instrument, warn};

/// Why a record was deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// The link redirected outside the crawlable domain.
    OffDomain { location: String },
    /// The page carries the site's not-found marker.
    PageNotFound,
    /// The article's own link could not be loaded at all.
    BrokenLink,
    MissingDate,
    InvalidDate,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::OffDomain { location } => write!(f, "off-domain location {location}"),
            DiscardReason::PageNotFound => f.write_str("page not found"),
            DiscardReason::BrokenLink => f.write_str("broken link"),
            DiscardReason::MissingDate => f.write_str("no publish date"),
            DiscardReason::InvalidDate => f.write_str("unparseable publish date"),
        }
    }
}

/// The step a cycle stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Asking the store for the next unprocessed record.
    Fetch,
    /// Loading the article's link failed with something other than a dead link.
    Navigate,
    /// Setting the processing flag.
    Lock,
    /// Looking for the not-found marker.
    Inspect,
    /// Reading the date and body; the article stays locked.
    Extract,
    /// Writing the extracted text back.
    Persist,
    /// Clearing the processing flag after a successful persist.
    Unlock,
    /// Removing a discarded record.
    Delete,
}

/// How the move to the next record ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// No unprocessed record is left.
    QueueEmpty,
    /// The store could not be asked for the next record.
    FetchFailed,
    /// The page was sent to this link.
    Navigated(String),
    /// The next record's link is the page we are already on.
    AlreadyThere,
    /// The next record exists but its link could not be loaded. The host
    /// stops; the record is picked up again on the next run.
    NavigationFailed,
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing to do.
    Idle,
    /// The page was not at the article yet; it has been sent there.
    Navigated { article_id: String, to: String },
    Discarded {
        article_id: String,
        reason: DiscardReason,
        next: Advance,
    },
    Completed { article_id: String, next: Advance },
    /// Stopped early without discarding. Any lock already taken is kept.
    Aborted {
        article_id: Option<String>,
        stage: Stage,
        reason: String,
    },
}

impl CycleOutcome {
    /// Whether the host should run another invocation on the current page.
    pub fn should_reinvoke(&self) -> bool {
        match self {
            CycleOutcome::Navigated { .. } => true,
            CycleOutcome::Discarded { next, .. } | CycleOutcome::Completed { next, .. } => {
                matches!(next, Advance::Navigated(_) | Advance::AlreadyThere)
            }
            CycleOutcome::Idle | CycleOutcome::Aborted { .. } => false,
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Idle => f.write_str("idle"),
            CycleOutcome::Navigated { article_id, to } => {
                write!(f, "navigated to {to} for article {article_id}")
            }
            CycleOutcome::Discarded {
                article_id,
                reason,
                next,
            } => write!(f, "discarded article {article_id} ({reason}), next: {next:?}"),
            CycleOutcome::Completed { article_id, next } => {
                write!(f, "completed article {article_id}, next: {next:?}")
            }
            CycleOutcome::Aborted {
                article_id,
                stage,
                reason,
            } => write!(
                f,
                "aborted at {stage:?} for article {}: {reason}",
                article_id.as_deref().unwrap_or("-")
            ),
        }
    }
}

fn aborted(article: Option<&Article>, stage: Stage, reason: impl fmt::Display) -> CycleOutcome {
    let article_id = article.map(|a| a.id.clone());
    error!(article_id = ?article_id, ?stage, error = %reason, "Aborting crawl cycle");
    CycleOutcome::Aborted {
        article_id,
        stage,
        reason: reason.to_string(),
    }
}

/// Drives one page through the crawl state machine against one queue.
#[derive(Debug)]
pub struct Crawler<Q, P> {
    queue: Q,
    page: P,
    config: CrawlConfig,
    validator: UrlValidator,
}

impl<Q, P> Crawler<Q, P>
where
    Q: ArticleQueue,
    P: Page,
{
    /// Create a crawler over a store and a page.
    ///
    /// # Arguments
    ///
    /// * `queue` - Store the records are claimed from and written back to
    /// * `page` - Page the articles are loaded into; its current location is
    ///   where the first invocation starts
    /// * `config` - Selectors and date policy used during extraction
    /// * `validator` - Domain check built by [`CrawlConfig::validate`]
    ///
    /// # Example
    ///
    /// ```ignore
    /// let validator = config.validate()?;
    /// let crawler = Crawler::new(queue, page, config, validator);
    /// ```
    pub fn new(queue: Q, page: P, config: CrawlConfig, validator: UrlValidator) -> Self {
        Self {
            queue,
            page,
            config,
            validator,
        }
    }

    #[cfg(test)]
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// Run one invocation from `Start` until the page moves or work stops.
    ///
    /// At most one article is handled. A link that cannot be loaded at all is
    /// discarded like a not-found page so it cannot hold up the queue.
    ///
    /// # Returns
    ///
    /// The [`CycleOutcome`] of this invocation. Failures are reported as
    /// [`CycleOutcome::Aborted`] rather than as an error; the host decides
    /// whether to continue with [`CycleOutcome::should_reinvoke`].
    #[instrument(level = "info", skip_all)]
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let mut article = match self.queue.fetch_next().await {
            Ok(Some(article)) => article,
            Ok(None) => return CycleOutcome::Idle,
            Err(e) => return aborted(None, Stage::Fetch, e),
        };

        if !is_at(&self.page, &article.link) {
            info!(
                article_id = %article.id,
                from = self.page.location(),
                to = %article.link,
                "Redirecting to article"
            );
            return match self.page.navigate(&article.link).await {
                Ok(()) => CycleOutcome::Navigated {
                    article_id: article.id,
                    to: article.link,
                },
                Err(e @ PageError::Navigation { .. }) => {
                    warn!(article_id = %article.id, error = %e, "Article link is unreachable");
                    self.discard(article, DiscardReason::BrokenLink).await
                }
                Err(e) => aborted(Some(&article), Stage::Navigate, e),
            };
        }

        let location = self.page.location().to_string();
        if !self.validator.is_valid(&location) {
            return self
                .discard(article, DiscardReason::OffDomain { location })
                .await;
        }

        if let Err(e) = self.queue.set_lock(&mut article, true).await {
            return aborted(Some(&article), Stage::Lock, e);
        }

        match self.page.exists(&self.config.selectors.not_found) {
            Ok(true) => return self.discard(article, DiscardReason::PageNotFound).await,
            Ok(false) => {}
            Err(e) => return aborted(Some(&article), Stage::Inspect, e),
        }

        if let Err(e) = extract(
            &mut article,
            &self.page,
            &self.config.selectors,
            self.config.meridian,
        ) {
            return match e {
                ExtractError::MissingDate => self.discard(article, DiscardReason::MissingDate).await,
                ExtractError::InvalidDate(_) => {
                    self.discard(article, DiscardReason::InvalidDate).await
                }
                other => {
                    warn!(article_id = %article.id, "Extraction failed without a discard reason; article stays locked");
                    aborted(Some(&article), Stage::Extract, other)
                }
            };
        }

        if let Err(e) = self.queue.persist(&article).await {
            return aborted(Some(&article), Stage::Persist, e);
        }
        if let Err(e) = self.queue.set_lock(&mut article, false).await {
            return aborted(Some(&article), Stage::Unlock, e);
        }
        info!(
            article_id = %article.id,
            text_length = article.text_length,
            date_published = ?article.date_published,
            preview = %truncate_for_log(&article.text, 120),
            "Article updated"
        );

        let next = self.advance().await;
        CycleOutcome::Completed {
            article_id: article.id,
            next,
        }
    }

    async fn discard(&mut self, article: Article, reason: DiscardReason) -> CycleOutcome {
        warn!(article_id = %article.id, link = %article.link, %reason, "Discarding article");
        if let Err(e) = self.queue.delete(&article).await {
            return aborted(Some(&article), Stage::Delete, e);
        }

        let next = self.advance().await;
        CycleOutcome::Discarded {
            article_id: article.id,
            reason,
            next,
        }
    }

    /// Fetch the next record and point the page at it.
    async fn advance(&mut self) -> Advance {
        let next = match self.queue.fetch_next().await {
            Ok(Some(next)) => next,
            Ok(None) => return Advance::QueueEmpty,
            Err(_) => return Advance::FetchFailed,
        };

        if is_at(&self.page, &next.link) {
            return Advance::AlreadyThere;
        }
        match self.page.navigate(&next.link).await {
            Ok(()) => Advance::Navigated(next.link),
            Err(e) => {
                error!(article_id = %next.id, error = %e, "Failed to navigate to next article");
                Advance::NavigationFailed
            }
        }
    }
}
