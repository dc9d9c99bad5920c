//! Command-line interface definitions for the CNA text extractor.
//!
//! Every option can also come from the environment. Options given here win
//! over the YAML config file, which wins over the built-in defaults.

use clap::Parser;

/// Command-line arguments for the crawl step.
///
/// # Examples
///
/// ```sh
/// # Crawl until the queue is empty, against a local store
/// cna_text_extractor
///
/// # One invocation only, against another store
/// cna_text_extractor --once --api-base-url http://store.internal:8000
///
/// # Selectors and date handling from a file
/// cna_text_extractor -c ./crawl.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML crawl config
    #[arg(short, long, env = "CNA_CONFIG")]
    pub config: Option<String>,

    /// Base URL of the article store
    #[arg(long, env = "CNA_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Source tag to request work for
    #[arg(long, env = "CNA_SOURCE")]
    pub source: Option<String>,

    /// Page to open before the first invocation
    #[arg(long, env = "CNA_START_URL")]
    pub start_url: Option<String>,

    /// Run a single invocation and exit
    #[arg(long)]
    pub once: bool,

    /// Upper bound on invocations in one run
    #[arg(long, env = "CNA_MAX_INVOCATIONS", default_value_t = 500)]
    pub max_invocations: usize,
}
