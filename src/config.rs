//! Configuration file parser (`config.toml` by default).
//!
//! `output`, `url` and `feeds` are required; a missing one is a fatal error
//! naming the key. `title` and `description` are optional here but required
//! by the feed assembler, which reports them itself. Unknown keys are
//! accepted and logged as warnings, since they are usually typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A required key is absent or empty.
    #[error("`{0}` variable missing. This program will NOT run without it set.")]
    Missing(&'static str),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Serialization format of the output document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// RSS 2.0
    #[default]
    Rss,
    /// Atom 1.0
    Atom,
}

/// Source fetching settings (`[fetch]` table).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Upper bound for one source, request and body read together.
    pub timeout_secs: u64,
    /// Number of sources fetched at the same time.
    pub concurrency: usize,
    /// Sources larger than this are skipped.
    pub max_feed_size_mb: usize,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            concurrency: 10,
            max_feed_size_mb: 10,
            user_agent: format!("rssingle/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchSettings {
    pub fn max_feed_size_bytes(&self) -> usize {
        self.max_feed_size_mb.saturating_mul(1024 * 1024)
    }
}

/// On-disk shape. Everything is optional so missing keys can be reported by
/// name instead of as a generic serde error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    output: Option<String>,
    url: Option<String>,
    feeds: Option<Vec<String>>,
    title: Option<String>,
    description: Option<String>,
    language: Option<String>,
    format: OutputFormat,
    fetch: FetchSettings,
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Output file name as configured; also the last segment of the root feed id.
    pub output: String,
    /// Public base URL the output file is served under.
    pub url: String,
    /// Source feed locators, in output order.
    pub feeds: Vec<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: String,
    pub format: OutputFormat,
    pub fetch: FetchSettings,
    /// Where the output file is written: `output` resolved against the
    /// directory holding the config file.
    pub output_path: PathBuf,
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "output",
        "url",
        "feeds",
        "title",
        "description",
        "language",
        "format",
        "fetch",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or unreadable file → `Err(ConfigError::Io)`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Missing `output`/`url`/`feeds` → `Err(ConfigError::Missing)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        let meta = std::fs::metadata(path)?;
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "Config file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let config = Self::from_toml_str(&content, base_dir)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            output = %config.output_path.display(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses and validates configuration text. A relative `output` is
    /// resolved against `base_dir`.
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let file: ConfigFile = toml::from_str(content)?;

        let output = required(file.output, "output")?;
        let url = required(file.url, "url")?;
        let feeds = file.feeds.ok_or(ConfigError::Missing("feeds"))?;
        if feeds.is_empty() {
            tracing::warn!("No source feeds configured, output will have no entries");
        }

        let output_path = base_dir.join(&output);

        Ok(Self {
            output,
            url,
            feeds,
            title: file.title,
            description: file.description,
            language: file.language.unwrap_or_else(|| "en".to_string()),
            format: file.format,
            fetch: file.fetch,
            output_path,
        })
    }

    /// Root feed id and self link: `url + "/" + output`.
    pub fn feed_url(&self) -> String {
        format!("{}/{}", self.url, self.output)
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

// ============================================================================
// Tests
// ============================================================================
