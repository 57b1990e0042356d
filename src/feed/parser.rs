use chrono::SecondsFormat;
use feed_rs::model::{Entry, Person};
use feed_rs::parser;
use serde_json::{json, Value};

use crate::feed::entry::RawEntry;

/// Parses RSS/Atom/JSON Feed bytes into raw entry bags.
///
/// Only the feed document as a whole can fail to parse; individual entries
/// are passed through as-is, missing fields and all, for the normalizer to
/// deal with. feed-rs would otherwise synthesize an id (hash or random UUID)
/// for entries without a guid; here a missing id stays missing.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RawEntry>, parser::ParseFeedError> {
    let feed = parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .build()
        .parse(bytes)?;
    Ok(feed.entries.into_iter().map(entry_to_raw).collect())
}

fn entry_to_raw(entry: Entry) -> RawEntry {
    let mut raw = RawEntry::new();

    if !entry.id.is_empty() {
        raw.insert("id", entry.id);
    }
    if let Some(title) = entry.title {
        raw.insert("title", title.content);
    }
    if let Some(link) = entry.links.into_iter().next() {
        raw.insert("link", link.href);
    }
    if !entry.authors.is_empty() {
        let authors: Vec<Value> = entry.authors.into_iter().map(person_to_value).collect();
        raw.insert("authors", authors);
    }
    if let Some(summary) = entry.summary {
        raw.insert("summary", summary.content);
    }
    if let Some(body) = entry.content.and_then(|c| c.body) {
        raw.insert("description", body);
    }
    if let Some(published) = entry.published {
        raw.insert(
            "published",
            published.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        );
    }

    raw
}

/// Authors keep the `href` shape when the feed only gave a URI; the
/// normalizer folds that into `email`.
fn person_to_value(person: Person) -> Value {
    let mut record = json!({ "name": person.name });
    if let Some(email) = person.email {
        record["email"] = Value::String(email);
    }
    if let Some(uri) = person.uri {
        record["href"] = Value::String(uri);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{normalize, DEFAULT_ID};

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Source</title>
    <item>
        <guid>item-1</guid>
        <title>First</title>
        <link>https://example.com/1</link>
        <description>First summary</description>
        <author>jane@example.com (Jane)</author>
        <pubDate>Tue, 14 Nov 2023 22:13:20 GMT</pubDate>
    </item>
    <item>
        <title>Second</title>
    </item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom Source</title>
    <id>urn:feed</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <entry>
        <id>urn:entry:1</id>
        <title>Atom Entry</title>
        <link href="https://example.com/atom/1"/>
        <author><name>Bob</name><uri>https://bob.example</uri></author>
        <content type="html">&lt;p&gt;Body&lt;/p&gt;</content>
        <published>2024-01-01T12:00:00Z</published>
        <updated>2024-01-02T12:00:00Z</updated>
    </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_entries() {
        let entries = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.get("id"), Some(&json!("item-1")));
        assert_eq!(first.get("title"), Some(&json!("First")));
        assert_eq!(first.get("link"), Some(&json!("https://example.com/1")));
        assert_eq!(first.get("summary"), Some(&json!("First summary")));
        assert_eq!(
            first.get("published"),
            Some(&json!("2023-11-14T22:13:20+00:00"))
        );

        let second = &entries[1];
        assert_eq!(second.get("id"), None);
        assert_eq!(second.get("title"), Some(&json!("Second")));
        assert_eq!(second.get("link"), None);
        assert_eq!(second.get("published"), None);
    }

    #[test]
    fn test_parse_atom_entry() {
        let entries = parse_feed(ATOM.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.get("id"), Some(&json!("urn:entry:1")));
        assert_eq!(entry.get("link"), Some(&json!("https://example.com/atom/1")));
        assert_eq!(entry.get("description"), Some(&json!("<p>Body</p>")));
        assert_eq!(
            entry.get("authors"),
            Some(&json!([{ "name": "Bob", "href": "https://bob.example" }]))
        );
    }

    #[test]
    fn test_guidless_items_default_to_blank_id() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>Linked</title><link>https://example.com/linked</link></item>
    <item><title>Unlinked</title></item>
</channel></rss>"#;

        for _ in 0..2 {
            let entries = parse_feed(rss.as_bytes()).unwrap();
            assert_eq!(entries.len(), 2);
            for raw in &entries {
                assert_eq!(raw.get("id"), None);
                assert_eq!(normalize(raw).id, DEFAULT_ID);
            }
        }
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_feed(b"<not valid xml").is_err());
    }

    #[test]
    fn test_parse_empty_channel() {
        let empty = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        assert!(parse_feed(empty.as_bytes()).unwrap().is_empty());
    }
}
