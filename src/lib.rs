//! rssingle: aggregates many RSS/Atom source feeds into one output feed.
//!
//! A run loads [`config::Config`], fetches every source through
//! [`feed::HttpFetcher`], normalizes each entry, and writes the assembled
//! feed to the configured output file.

pub mod aggregate;
pub mod config;
pub mod feed;
pub mod logging;
pub mod util;

use anyhow::{Context, Result};
use std::path::Path;

use aggregate::{AggregationReport, Aggregator};
use config::{Config, OutputFormat};
use feed::HttpFetcher;

/// Where the rendered feed goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    /// The configured output file, replaced atomically.
    #[default]
    File,
    Stdout,
}

/// Runs one aggregation pass for the config file at `config_path`.
///
/// `format` overrides the configured output format. Nothing is written when
/// the pass fails.
pub async fn run(
    config_path: &Path,
    format: Option<OutputFormat>,
    destination: Destination,
) -> Result<AggregationReport> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;
    let fetcher = HttpFetcher::new(&config.fetch).context("Failed to build HTTP client")?;

    let report = Aggregator::new(&config, fetcher).run().await?;
    let format = format.unwrap_or(config.format);

    match destination {
        Destination::File => {
            feed::write_to_file(&report.feed, format, &config.output_path)?;
            tracing::info!(
                path = %config.output_path.display(),
                entries = report.feed.entries.len(),
                "Feed written"
            );
        }
        Destination::Stdout => {
            let document = feed::render(&report.feed, format)?;
            println!("{document}");
        }
    }

    for source in report.failed_sources() {
        tracing::error!(
            feed = %source.locator,
            error = source.error.as_deref().unwrap_or_default(),
            "Source skipped"
        );
    }

    Ok(report)
}
