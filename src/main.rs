//! # CNA Text Extractor
//!
//! Claims unprocessed Channel NewsAsia article records from a remote store,
//! loads each article page, extracts the publish date and body text, and
//! writes the result back.
//!
//! ## Usage
//!
//! ```sh
//! cna_text_extractor --api-base-url http://localhost:8000
//! ```
//!
//! ## Architecture
//!
//! The crawl step is a one-shot state machine ([`crawler::Crawler::run_cycle`]).
//! Each invocation handles at most one article and ends by moving the page to
//! the next record. This binary plays the part of the page-load trigger: it
//! re-invokes the step for as long as the previous invocation moved the page.
//! 1. **Claim**: fetch a record whose text is empty and lock it
//! 2. **Check**: make sure the page is the article, on the right domain, and not a 404
//! 3. **Extract**: publish date and body paragraphs
//! 4. **Store**: persist, unlock, and head to the next record

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawler;
mod date;
mod error;
mod extract;
mod models;
mod page;
mod queue;
mod utils;
mod validate;

use cli::Cli;
use config::CrawlConfig;
use crawler::{Crawler, CycleOutcome};
use page::{Dom, LivePage, Page};
use queue::HttpQueueClient;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("cna_text_extractor starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid crawl configuration");
            return Err(e);
        }
    };
    let validator = config.validate()?;
    info!(
        api_base_url = %config.api_base_url,
        source = %config.source,
        meridian = ?config.meridian,
        "Configuration ready"
    );

    let queue = HttpQueueClient::new(&config.api_base_url, &config.source)?;
    let mut page = LivePage::new(config.page_timeout())?;
    if let Err(e) = page.navigate(&config.start_url).await {
        error!(start_url = %config.start_url, error = %e, "Could not open start page");
        return Err(e.into());
    }

    let mut crawler = Crawler::new(queue, page, config, validator);
    let mut invocations = 0usize;
    let mut last = CycleOutcome::Idle;

    while invocations < args.max_invocations {
        invocations += 1;
        last = crawler.run_cycle().await;
        info!(invocation = invocations, outcome = %last, "Invocation finished");

        if args.once || !last.should_reinvoke() {
            break;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        invocations,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        last_outcome = %last,
        location = crawler.page().location(),
        "Execution complete"
    );

    Ok(())
}

/// Defaults, then the YAML file if one was given, then CLI/env overrides.
fn load_config(args: &Cli) -> Result<CrawlConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => CrawlConfig::load(path)?,
        None => CrawlConfig::default(),
    };

    if let Some(url) = &args.api_base_url {
        config.api_base_url = url.clone();
    }
    if let Some(source) = &args.source {
        config.source = source.clone();
    }
    if let Some(start_url) = &args.start_url {
        config.start_url = start_url.clone();
    }
    Ok(config)
}
