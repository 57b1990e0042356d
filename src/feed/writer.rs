//! Output feed serialization.
//!
//! Renders an [`OutputFeed`] snapshot as RSS 2.0 or Atom 1.0 with
//! `quick-xml`, and writes the document atomically so a reader of the output
//! path never sees a partially written feed.

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

use crate::config::OutputFormat;
use crate::feed::assembler::OutputFeed;
use crate::feed::entry::Author;
use crate::util::sanitize_xml_text;

const RSS_DOCS: &str = "http://www.rssboard.org/rss-specification";
const NS_ATOM: &str = "http://www.w3.org/2005/Atom";
const NS_CONTENT: &str = "http://purl.org/rss/1.0/modules/content/";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Renders the feed in the requested format.
pub fn render(feed: &OutputFeed, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Rss => to_rss(feed),
        OutputFormat::Atom => to_atom(feed),
    }
}

// ============================================================================
// RSS 2.0
// ============================================================================

pub fn to_rss(feed: &OutputFeed) -> Result<String> {
    let meta = &feed.metadata;
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    declaration(&mut writer)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("xmlns:atom", NS_ATOM));
    rss.push_attribute(("xmlns:content", NS_CONTENT));
    rss.push_attribute(("xmlns:dc", NS_DC));
    rss.push_attribute(("version", "2.0"));
    writer
        .write_event(Event::Start(rss))
        .context("Failed to write rss element")?;
    start(&mut writer, "channel")?;

    text_element(&mut writer, "title", &meta.title)?;
    text_element(&mut writer, "link", &meta.link)?;
    text_element(&mut writer, "description", &meta.subtitle)?;
    empty_element(
        &mut writer,
        "atom:link",
        &[("href", meta.link.as_str()), ("rel", "self")],
    )?;
    text_element(&mut writer, "docs", RSS_DOCS)?;
    text_element(&mut writer, "generator", &meta.generator)?;
    text_element(&mut writer, "language", &meta.language)?;
    text_element(&mut writer, "lastBuildDate", &meta.last_build.to_rfc2822())?;

    for entry in &feed.entries {
        start(&mut writer, "item")?;
        text_element(&mut writer, "title", &entry.title)?;
        text_element(&mut writer, "link", &entry.link)?;
        text_element(&mut writer, "description", &entry.description)?;
        if let Some(ref content) = entry.content {
            text_element(&mut writer, "content:encoded", content)?;
        }

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer
            .write_event(Event::Start(guid))
            .context("Failed to write guid element")?;
        text(&mut writer, &entry.id)?;
        end(&mut writer, "guid")?;

        for author in &entry.authors {
            match rss_author(author) {
                Some(value) => text_element(&mut writer, "author", &value)?,
                None if author.name.is_empty() => {
                    text_element(&mut writer, "dc:creator", &author.email)?
                }
                None => text_element(&mut writer, "dc:creator", &author.name)?,
            }
        }
        text_element(&mut writer, "pubDate", &entry.published.to_rfc2822())?;
        end(&mut writer, "item")?;
    }

    end(&mut writer, "channel")?;
    end(&mut writer, "rss")?;
    finish(writer)
}

/// RSS `<author>` must carry an email address: `email (name)`. Authors with
/// only a name, or a profile URI in place of an address, go to
/// `<dc:creator>` instead.
fn rss_author(author: &Author) -> Option<String> {
    if !is_email_address(&author.email) {
        return None;
    }
    if author.name.is_empty() {
        Some(author.email.clone())
    } else {
        Some(format!("{} ({})", author.email, author.name))
    }
}

/// `Author::email` also holds `href` values taken from sources that link a
/// profile instead of giving an address.
fn is_email_address(value: &str) -> bool {
    value.contains('@') && !value.contains("://")
}

// ============================================================================
// Atom 1.0
// ============================================================================

pub fn to_atom(feed: &OutputFeed) -> Result<String> {
    let meta = &feed.metadata;
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    declaration(&mut writer)?;

    let mut root = BytesStart::new("feed");
    root.push_attribute(("xmlns", NS_ATOM));
    root.push_attribute(("xml:lang", meta.language.as_str()));
    writer
        .write_event(Event::Start(root))
        .context("Failed to write feed element")?;

    text_element(&mut writer, "id", &meta.id)?;
    text_element(&mut writer, "title", &meta.title)?;
    text_element(&mut writer, "updated", &meta.last_build.to_rfc3339())?;
    empty_element(
        &mut writer,
        "link",
        &[("href", meta.link.as_str()), ("rel", "self")],
    )?;
    text_element(&mut writer, "generator", &meta.generator)?;
    text_element(&mut writer, "subtitle", &meta.subtitle)?;

    for entry in &feed.entries {
        start(&mut writer, "entry")?;
        text_element(&mut writer, "id", &entry.id)?;
        text_element(&mut writer, "title", &entry.title)?;
        text_element(&mut writer, "updated", &entry.updated.to_rfc3339())?;
        for author in &entry.authors {
            start(&mut writer, "author")?;
            // atom:author requires a name
            let name = if author.name.is_empty() {
                author.email.as_str()
            } else {
                author.name.as_str()
            };
            text_element(&mut writer, "name", name)?;
            if is_email_address(&author.email) {
                text_element(&mut writer, "email", &author.email)?;
            } else if !author.email.is_empty() {
                text_element(&mut writer, "uri", &author.email)?;
            }
            end(&mut writer, "author")?;
        }
        if let Some(ref content) = entry.content {
            let mut el = BytesStart::new("content");
            el.push_attribute(("type", "html"));
            writer
                .write_event(Event::Start(el))
                .context("Failed to write content element")?;
            text(&mut writer, content)?;
            end(&mut writer, "content")?;
        }
        empty_element(&mut writer, "link", &[("href", entry.link.as_str())])?;
        text_element(&mut writer, "summary", &entry.summary)?;
        text_element(&mut writer, "published", &entry.published.to_rfc3339())?;
        end(&mut writer, "entry")?;
    }

    end(&mut writer, "feed")?;
    finish(writer)
}

// ============================================================================
// XML helpers
// ============================================================================

fn declaration(writer: &mut XmlWriter) -> Result<()> {
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")
}

fn start(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))
}

fn text(writer: &mut XmlWriter, value: &str) -> Result<()> {
    let clean = sanitize_xml_text(value);
    writer
        .write_event(Event::Text(BytesText::new(&clean)))
        .context("Failed to write text")
}

fn text_element(writer: &mut XmlWriter, name: &str, value: &str) -> Result<()> {
    start(writer, name)?;
    text(writer, value)?;
    end(writer, name)
}

fn empty_element(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut el = BytesStart::new(name);
    for &(key, value) in attrs {
        let clean = sanitize_xml_text(value);
        el.push_attribute((key, &*clean));
    }
    writer
        .write_event(Event::Empty(el))
        .with_context(|| format!("Failed to write {name} element"))
}

fn finish(writer: XmlWriter) -> Result<String> {
    let result = writer.into_inner().into_inner();
    String::from_utf8(result).context("Generated feed contains invalid UTF-8")
}

// ============================================================================
// File output
// ============================================================================

/// Renders the feed and writes it to `path` atomically.
///
/// The document is rendered fully in memory first, then written to a
/// temporary file in the same directory, synced, and renamed over the
/// destination. A failure at any step leaves the previous output untouched.
pub fn write_to_file(feed: &OutputFeed, format: OutputFormat, path: &Path) -> Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let content = render(feed, format)?;

    // SEC-009: Randomized temp filename to prevent TOCTOU race conditions
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| {
            format!(
                "Failed to create temporary file '{}': check directory permissions",
                temp_path.display()
            )
        })?;

    std::io::Write::write_all(&mut file, content.as_bytes()).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to write feed to temporary file '{}'",
            temp_path.display()
        )
    })?;

    file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to sync temporary file '{}' to disk",
            temp_path.display()
        )
    })?;

    drop(file);

    // On Windows, rename fails if destination exists, so remove it first
    #[cfg(windows)]
    if path.exists() {
        std::fs::remove_file(path).with_context(|| {
            let _ = std::fs::remove_file(&temp_path);
            format!("Failed to remove existing '{}'", path.display())
        })?;
    }

    std::fs::rename(&temp_path, path).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}'",
            temp_path.display(),
            path.display()
        )
    })?;

    tracing::info!(
        path = %path.display(),
        entries = feed.entries.len(),
        "Wrote output feed"
    );
    Ok(())
}
