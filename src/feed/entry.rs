//! Entry types flowing through the aggregation pipeline.
//!
//! A [`RawEntry`] is whatever a source feed handed us: an untyped bag of
//! keys that may be missing, empty, or of the wrong shape. A
//! [`CanonicalEntry`] is the fully populated record produced by
//! [`normalize`](crate::feed::normalize), which downstream code can use
//! without further checks.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

// ============================================================================
// Raw (untrusted) entries
// ============================================================================

/// An untrusted entry as produced by a feed parser.
///
/// Keys follow the conventional feed vocabulary (`id`, `title`, `link`,
/// `authors`, `sources`, `summary`, `description`, `content`, `published`),
/// but no key is guaranteed to exist or to hold a value of the expected type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawEntry(Map<String, Value>);

impl RawEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an arbitrary JSON value. Anything other than an object yields
    /// an empty entry, which normalizes to all defaults.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Canonical (trusted) entries
// ============================================================================

pub const DEFAULT_ID: &str = "about:blank";
pub const DEFAULT_LINK: &str = "about:blank";
pub const DEFAULT_TITLE: &str = "Unspecified";
pub const DEFAULT_SUMMARY: &str = "Unspecified";

/// An entry author after shape repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    /// Email address, or the author's `href` when the source used that key.
    /// Empty when the source gave only a name.
    pub email: String,
}

/// A normalized entry. Every field is populated.
///
/// `summary`/`description` are always set together, as are
/// `published`/`updated`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub authors: Vec<Author>,
    pub summary: String,
    pub description: String,
    /// Full content: the source's `content`, or its description when that
    /// stood in for a missing summary.
    pub content: Option<String>,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Re-encodes a canonical entry as a raw bag, so it can be fed back through
/// the normalizer.
impl From<&CanonicalEntry> for RawEntry {
    fn from(entry: &CanonicalEntry) -> Self {
        let authors: Vec<Value> = entry
            .authors
            .iter()
            .map(|a| serde_json::json!({ "name": a.name, "email": a.email }))
            .collect();

        let mut raw = RawEntry::new()
            .with("id", entry.id.as_str())
            .with("title", entry.title.as_str())
            .with("link", entry.link.as_str())
            .with("authors", authors)
            .with("summary", entry.summary.as_str())
            .with("description", entry.description.as_str())
            .with(
                "published",
                entry.published.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            );
        if let Some(ref content) = entry.content {
            raw.insert("content", content.as_str());
        }
        raw
    }
}
