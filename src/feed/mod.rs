//! Feed pipeline: fetching, parsing, canonicalization, assembly, output.
//!
//! - [`fetcher`] - Retrieves source feeds over HTTP or from disk, never
//!   failing the caller
//! - [`parser`] - Low-level feed parsing using the `feed-rs` crate
//! - [`normalize`] - Maps untrusted entries to fully populated records
//! - [`assembler`] - Root metadata and the ordered output entry list
//! - [`writer`] - RSS 2.0 / Atom 1.0 serialization and atomic file output
//!
//! # Example
//!
//! ```ignore
//! use rssingle::feed::{fetch, normalize, Assembler, FeedMetadata, HttpFetcher};
//!
//! let mut assembler = Assembler::init(FeedMetadata::from_config(&config)?);
//! let fetcher = HttpFetcher::new(&config.fetch)?;
//! for raw in fetch(&fetcher, "https://example.com/feed.xml").await.into_entries() {
//!     assembler.append(normalize(&raw));
//! }
//! ```

mod assembler;
mod entry;
mod fetcher;
mod normalize;
mod parser;
mod writer;

pub use assembler::{AssembleError, Assembler, FeedMetadata, OutputFeed, GENERATOR};
pub use entry::{Author, CanonicalEntry, RawEntry};
pub use entry::{DEFAULT_ID, DEFAULT_LINK, DEFAULT_SUMMARY, DEFAULT_TITLE};
pub use fetcher::{fetch, FetchError, FetchFeed, HttpFetcher, Locator, SourceResult};
pub use normalize::normalize;
pub use parser::parse_feed;
pub use writer::{render, to_atom, to_rss, write_to_file};
