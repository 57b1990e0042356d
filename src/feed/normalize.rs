//! Entry canonicalization.
//!
//! Source feeds are frequently malformed: ids go missing, titles are empty,
//! authors come in several shapes, dates are unparsable. [`normalize`] maps
//! any [`RawEntry`] to a fully populated [`CanonicalEntry`], resolving each
//! field independently against a fixed fallback policy:
//!
//! | Field | Taken from | Default |
//! |---|---|---|
//! | id | `id` | `about:blank` |
//! | title | `title` | `Unspecified` |
//! | link | `link` | `about:blank` |
//! | authors | `sources.authors`, else `authors` | empty |
//! | summary/description | `summary`, else `description` | `Unspecified` pair |
//! | published/updated | `published` | Unix epoch |
//!
//! Every check is an explicit presence/validity test returning `Option`.
//! Nothing here can fail; a bad field only ever degrades to its default.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::feed::entry::{
    Author, CanonicalEntry, RawEntry, DEFAULT_ID, DEFAULT_LINK, DEFAULT_SUMMARY, DEFAULT_TITLE,
};
use crate::util::clean_field;

/// Normalizes one raw entry.
pub fn normalize(raw: &RawEntry) -> CanonicalEntry {
    let id = text_field(raw, "id").unwrap_or_else(|| {
        tracing::warn!("Empty id attribute, defaulting");
        DEFAULT_ID.to_string()
    });

    let title = string_field(raw, "title").unwrap_or_else(|| {
        tracing::warn!(id = %id, "Empty title attribute, defaulting");
        DEFAULT_TITLE.to_string()
    });

    let link = string_field(raw, "link").unwrap_or_else(|| {
        tracing::warn!(id = %id, "Empty link attribute, defaulting");
        DEFAULT_LINK.to_string()
    });

    let authors = resolve_authors(raw);
    if authors.is_empty() {
        tracing::debug!(id = %id, "No usable authors");
    }

    let (summary, description, content) = resolve_summary(raw).unwrap_or_else(|| {
        tracing::warn!(id = %id, "Empty description and summary attributes, defaulting");
        (
            DEFAULT_SUMMARY.to_string(),
            DEFAULT_SUMMARY.to_string(),
            string_field(raw, "content"),
        )
    });

    let published = match raw.get("published") {
        None | Some(Value::Null) => {
            tracing::warn!(id = %id, "Empty publish attribute, defaulting");
            DateTime::<Utc>::UNIX_EPOCH
        }
        Some(value) => parse_timestamp(value).unwrap_or_else(|| {
            tracing::warn!(id = %id, published = %value, "Unparsable publish date, defaulting");
            DateTime::<Utc>::UNIX_EPOCH
        }),
    };

    CanonicalEntry {
        id,
        title,
        link,
        authors,
        summary,
        description,
        content,
        published,
        updated: published,
    }
}

// ============================================================================
// Field Accessors
// ============================================================================

/// A string value that is non-empty once trimmed and sanitized.
fn string_value(value: &Value) -> Option<String> {
    value.as_str().and_then(clean_field)
}

fn string_field(raw: &RawEntry, key: &str) -> Option<String> {
    raw.get(key).and_then(string_value)
}

/// Like [`string_field`], but also accepts integers (numeric guids are common
/// in RSS 2.0 feeds).
fn text_field(raw: &RawEntry, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::Number(n) => Some(n.to_string()),
        other => string_value(other),
    }
}

// ============================================================================
// Authors
// ============================================================================

/// Picks the author list: `sources.authors` when it yields at least one
/// usable author, otherwise the entry-level `authors`.
fn resolve_authors(raw: &RawEntry) -> Vec<Author> {
    let from_source = raw
        .get("sources")
        .and_then(|s| s.get("authors"))
        .map(parse_authors)
        .unwrap_or_default();
    if !from_source.is_empty() {
        return from_source;
    }

    raw.get("authors").map(parse_authors).unwrap_or_default()
}

/// Accepts either a list of author records or a single record.
fn parse_authors(value: &Value) -> Vec<Author> {
    match value {
        Value::Array(items) => items.iter().filter_map(parse_author).collect(),
        other => parse_author(other).into_iter().collect(),
    }
}

fn parse_author(value: &Value) -> Option<Author> {
    match value {
        Value::String(s) => clean_field(s).map(|name| Author {
            name,
            email: String::new(),
        }),
        Value::Object(record) => {
            let name = record.get("name").and_then(string_value);
            let email = record.get("email").and_then(string_value).or_else(|| {
                let href = record.get("href").and_then(string_value);
                if href.is_some() {
                    tracing::debug!("Author record uses href instead of email, adjusting");
                }
                href
            });
            if name.is_none() && email.is_none() {
                return None;
            }
            Some(Author {
                name: name.unwrap_or_default(),
                email: email.unwrap_or_default(),
            })
        }
        _ => None,
    }
}

// ============================================================================
// Summary / Description
// ============================================================================

/// Returns `(summary, description, content)`, or `None` when the source has
/// neither a summary nor a description.
fn resolve_summary(raw: &RawEntry) -> Option<(String, String, Option<String>)> {
    if let Some(summary) = string_field(raw, "summary") {
        return Some((summary.clone(), summary, string_field(raw, "content")));
    }

    let description = string_field(raw, "description")?;
    Some((description.clone(), description.clone(), Some(description)))
}

// ============================================================================
// Dates
// ============================================================================

/// Parses a publish date in any of the forms feeds are seen using in practice.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }?;
    // Four-digit years only; anything else cannot be written back as RFC 3339.
    (1..=9999).contains(&parsed.year()).then_some(parsed)
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
