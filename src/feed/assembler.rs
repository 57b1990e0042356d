use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::Config;
use crate::feed::entry::CanonicalEntry;

/// Generator string stamped on every output feed.
pub const GENERATOR: &str = concat!("rssingle/v", env!("CARGO_PKG_VERSION"));

/// The output feed's root metadata could not be built.
///
/// This is the one place a missing configuration value is fatal: without
/// these the output feed has no identity.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Error initialising the feed: `{0}` is missing or empty")]
    MissingMetadata(&'static str),
}

/// Root metadata of the output feed. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedMetadata {
    /// `url + "/" + output`
    pub id: String,
    pub title: String,
    pub generator: String,
    /// Self link; same value as `id`.
    pub link: String,
    pub subtitle: String,
    pub language: String,
    /// When this run started assembling the feed.
    pub last_build: DateTime<Utc>,
}

impl FeedMetadata {
    /// Builds root metadata from configuration.
    ///
    /// # Errors
    ///
    /// [`AssembleError::MissingMetadata`] when `url`, `output`, `title` or
    /// `description` is missing or blank.
    pub fn from_config(config: &Config) -> Result<Self, AssembleError> {
        present(Some(&config.url), "url")?;
        present(Some(&config.output), "output")?;
        let title = present(config.title.as_ref(), "title")?;
        let subtitle = present(config.description.as_ref(), "description")?;
        let id = config.feed_url();

        Ok(Self {
            link: id.clone(),
            id,
            title,
            generator: GENERATOR.to_string(),
            subtitle,
            language: config.language.clone(),
            last_build: Utc::now(),
        })
    }
}

fn present(value: Option<&String>, key: &'static str) -> Result<String, AssembleError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(AssembleError::MissingMetadata(key)),
    }
}

/// The in-memory output feed: root metadata plus entries in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFeed {
    pub metadata: FeedMetadata,
    pub entries: Vec<CanonicalEntry>,
}

/// Accumulates normalized entries under fixed root metadata.
///
/// Append-only: entries are never reordered, edited, or deduplicated.
#[derive(Debug)]
pub struct Assembler {
    feed: OutputFeed,
}

impl Assembler {
    pub fn init(metadata: FeedMetadata) -> Self {
        tracing::debug!(id = %metadata.id, "Feed initialised");
        Self {
            feed: OutputFeed {
                metadata,
                entries: Vec::new(),
            },
        }
    }

    pub fn append(&mut self, entry: CanonicalEntry) {
        self.feed.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.feed.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feed.entries.is_empty()
    }

    /// Read-only view for serialization.
    pub fn snapshot(&self) -> &OutputFeed {
        &self.feed
    }

    pub fn into_feed(self) -> OutputFeed {
        self.feed
    }
}
