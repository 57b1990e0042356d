//! Aggregation driver.
//!
//! Runs one aggregation pass: build the root metadata (the only fatal step),
//! fetch every configured source concurrently, then normalize and append
//! entries in configured source order. Fetch completion order never affects
//! the output.

use futures::stream::{self, StreamExt};

use crate::config::Config;
use crate::feed::{
    fetch, normalize, AssembleError, Assembler, FeedMetadata, FetchFeed, OutputFeed,
};

/// Per-source summary of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub locator: String,
    /// Entries this source contributed.
    pub entries: usize,
    /// Why the source contributed nothing, if it failed.
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct AggregationReport {
    pub feed: OutputFeed,
    /// One outcome per configured source, in configured order.
    pub sources: Vec<SourceOutcome>,
}

impl AggregationReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources.iter().filter(|s| s.is_failure())
    }
}

/// Drives one aggregation pass over the configured sources.
pub struct Aggregator<'a, F> {
    config: &'a Config,
    fetcher: F,
}

impl<'a, F> Aggregator<'a, F>
where
    F: FetchFeed,
{
    pub fn new(config: &'a Config, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// Runs the pass.
    ///
    /// # Errors
    ///
    /// Only root metadata construction can fail. Source fetch and parse
    /// failures are logged and reported in [`AggregationReport::sources`].
    pub async fn run(&self) -> Result<AggregationReport, AssembleError> {
        tracing::debug!("Initialising the feed");
        let mut assembler = Assembler::init(FeedMetadata::from_config(self.config)?);

        let total = self.config.feeds.len();
        let concurrency = self.config.fetch.concurrency.max(1);
        tracing::info!(sources = total, concurrency, "Begin processing feeds");

        // `buffered` yields in input order, whatever order the fetches finish in.
        let fetcher = &self.fetcher;
        let results: Vec<_> = stream::iter(self.config.feeds.iter())
            .map(|locator| fetch(fetcher, locator))
            .buffered(concurrency)
            .collect()
            .await;

        let mut sources = Vec::with_capacity(total);
        for source in results {
            let locator = source.locator.clone();
            let error = source.result.as_ref().err().map(|e| e.to_string());
            let raw_entries = source.into_entries();
            let count = raw_entries.len();

            tracing::debug!(feed = %locator, entries = count, "Iterating over source feed entries");
            for raw in &raw_entries {
                assembler.append(normalize(raw));
            }

            sources.push(SourceOutcome {
                locator,
                entries: count,
                error,
            });
        }

        let failed = sources.iter().filter(|s| s.is_failure()).count();
        tracing::info!(
            entries = assembler.len(),
            sources = total,
            failed,
            "Aggregation complete"
        );

        Ok(AggregationReport {
            feed: assembler.into_feed(),
            sources,
        })
    }
}
