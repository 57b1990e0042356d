//! End-to-end runs: config file on disk, sources served by a mock HTTP server,
//! output feed written next to the config.

use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rssingle::config::OutputFormat;
use rssingle::feed::parse_feed;
use rssingle::{run, Destination};

const RSS_ONE_ITEM: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Source A</title>
    <link>https://a.example</link>
    <description>A</description>
    <item>
      <title>First post</title>
      <link>https://a.example/1</link>
      <guid>a-1</guid>
      <description>Hello</description>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

const ATOM_TWO_ENTRIES: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Source C</title>
  <id>urn:c</id>
  <updated>2024-02-01T00:00:00Z</updated>
  <entry>
    <title>C one</title>
    <id>c-1</id>
    <updated>2024-02-01T00:00:00Z</updated>
    <link href="https://c.example/1"/>
    <author><name>Carol</name><email>carol@c.example</email></author>
    <summary>one</summary>
  </entry>
  <entry>
    <title>C two</title>
    <id>c-2</id>
    <updated>2024-02-02T00:00:00Z</updated>
    <link href="https://c.example/2"/>
  </entry>
</feed>"#;

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn write_config(dir: &Path, feeds: &[String]) -> PathBuf {
    let list = feeds
        .iter()
        .map(|f| format!("\"{f}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let content = format!(
        r#"output = "out.xml"
url = "https://x"
title = "All of it"
description = "Everything"
feeds = [{list}]

[fetch]
timeout_secs = 5
"#
    );
    let path = dir.join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn entry_ids(document: &[u8]) -> Vec<String> {
    parse_feed(document)
        .unwrap()
        .iter()
        .filter_map(|e| e.get("id").and_then(|v| v.as_str()).map(String::from))
        .collect()
}

/// Collects formatted log lines so tests can assert on diagnostics.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_unreachable_source_is_skipped() {
    let server = MockServer::start().await;
    serve(&server, "/a.xml", RSS_ONE_ITEM).await;

    let dir = tempfile::tempdir().unwrap();
    let feeds = vec![
        format!("{}/a.xml", server.uri()),
        // Discard port: nothing listens there
        "http://127.0.0.1:9/feed.xml".to_string(),
    ];
    let config = write_config(dir.path(), &feeds);

    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let report = run(&config, None, Destination::File).await.unwrap();

    let warnings: Vec<String> = logs
        .lines()
        .into_iter()
        .filter(|l| l.contains("WARN"))
        .collect();
    assert!(
        warnings
            .iter()
            .any(|l| l.contains("http://127.0.0.1:9/feed.xml")),
        "no warning names the unreachable source: {warnings:?}"
    );
    assert!(!warnings.iter().any(|l| l.contains("/a.xml")));

    let written = std::fs::read(dir.path().join("out.xml")).unwrap();
    let text = String::from_utf8(written.clone()).unwrap();
    assert!(text.contains("https://x/out.xml"));
    assert!(text.contains("<title>All of it</title>"));
    assert_eq!(entry_ids(&written), vec!["a-1"]);

    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.sources[0].entries, 1);
    assert!(!report.sources[0].is_failure());
    let failed: Vec<_> = report
        .failed_sources()
        .map(|s| s.locator.as_str())
        .collect();
    assert_eq!(failed, vec!["http://127.0.0.1:9/feed.xml"]);
}

#[tokio::test]
async fn test_entries_follow_configured_source_order() {
    let server = MockServer::start().await;
    serve(&server, "/a.xml", RSS_ONE_ITEM).await;
    serve(&server, "/c.xml", ATOM_TWO_ENTRIES).await;

    let dir = tempfile::tempdir().unwrap();
    let feeds = vec![
        format!("{}/c.xml", server.uri()),
        format!("{}/a.xml", server.uri()),
    ];
    let config = write_config(dir.path(), &feeds);

    let report = run(&config, None, Destination::File).await.unwrap();
    assert!(report.failed_sources().next().is_none());

    let written = std::fs::read(dir.path().join("out.xml")).unwrap();
    assert_eq!(entry_ids(&written), vec!["c-1", "c-2", "a-1"]);
}

#[tokio::test]
async fn test_format_override_writes_atom() {
    let server = MockServer::start().await;
    serve(&server, "/a.xml", RSS_ONE_ITEM).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &[format!("{}/a.xml", server.uri())]);

    run(&config, Some(OutputFormat::Atom), Destination::File)
        .await
        .unwrap();

    let written = std::fs::read(dir.path().join("out.xml")).unwrap();
    let text = String::from_utf8(written.clone()).unwrap();
    assert!(text.contains("<feed xmlns=\"http://www.w3.org/2005/Atom\""));
    assert!(text.contains("<id>https://x/out.xml</id>"));
    assert_eq!(entry_ids(&written), vec!["a-1"]);
}

#[tokio::test]
async fn test_local_file_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("local.xml");
    std::fs::write(&source, ATOM_TWO_ENTRIES).unwrap();

    let config = write_config(dir.path(), &[source.display().to_string()]);
    let report = run(&config, None, Destination::File).await.unwrap();

    assert_eq!(report.feed.entries.len(), 2);
    assert_eq!(report.feed.entries[0].authors[0].name, "Carol");
}

#[tokio::test]
async fn test_stdout_destination_writes_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &[]);

    let report = run(&config, None, Destination::Stdout).await.unwrap();
    assert!(report.feed.entries.is_empty());
    assert!(!dir.path().join("out.xml").exists());
}

#[tokio::test]
async fn test_missing_feeds_key_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "output = \"out.xml\"\nurl = \"https://x\"\n").unwrap();

    let err = run(&config, None, Destination::File).await.unwrap_err();
    assert!(format!("{err:#}").contains("`feeds` variable missing"));
    assert!(!dir.path().join("out.xml").exists());
}

#[tokio::test]
async fn test_missing_title_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "output = \"out.xml\"\nurl = \"https://x\"\ndescription = \"D\"\nfeeds = []\n",
    )
    .unwrap();

    let err = run(&config, None, Destination::File).await.unwrap_err();
    assert!(err.to_string().contains("`title` is missing"));
    assert!(!dir.path().join("out.xml").exists());
}

#[tokio::test]
async fn test_existing_output_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("out.xml"), "stale").unwrap();
    let config = write_config(dir.path(), &[]);

    run(&config, None, Destination::File).await.unwrap();

    let text = std::fs::read_to_string(dir.path().join("out.xml")).unwrap();
    assert!(text.starts_with("<?xml"));
    assert!(!text.contains("stale"));
}
