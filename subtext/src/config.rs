use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default per-format fetch deadline.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for the backend metadata lookup.
const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(120);

/// Largest subtitle payload accepted from a single format URL (32 MiB).
const DEFAULT_MAX_PAYLOAD_BYTES: usize = 32 * 1024 * 1024;

/// A requested subtitle language tag.
///
/// Accepts short codes ("en", "de") and regional tags ("en-us", "pt-br").
/// Input is trimmed and lowercased; an empty string means English.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    /// Validate a language tag: 2-5 ASCII letters, digits or hyphens.
    pub fn new(lang: &str) -> Result<Self> {
        let lower = lang.trim().to_lowercase();
        if lower.is_empty() {
            return Ok(Language::default());
        }

        let valid_chars = lower
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid_chars || !(2..=5).contains(&lower.len()) {
            return Err(Error::InvalidLanguage(lang.to_string()));
        }

        Ok(Language(lower))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for Language {
    fn default() -> Self {
        Language("en".into())
    }
}

/// Builder for extraction options.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub language: Language,
    /// Deadline for each subtitle format download.
    pub fetch_timeout: Duration,
    /// Deadline for the backend metadata lookup.
    pub backend_timeout: Duration,
    pub max_payload_bytes: usize,
    /// Format kinds to try first, in order. Empty keeps the backend's order.
    pub prefer_formats: Vec<String>,
    /// yt-dlp executable; `None` resolves "yt-dlp" from PATH.
    pub yt_dlp_path: Option<PathBuf>,
    pub user_agent: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            language: Language::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            prefer_formats: Vec::new(),
            yt_dlp_path: None,
            user_agent: None,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested language. See [`Language::new`] for accepted input.
    pub fn language(mut self, lang: &str) -> Result<Self> {
        self.language = Language::new(lang)?;
        Ok(self)
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::InvalidOption("fetch timeout must be non-zero".into()));
        }
        self.fetch_timeout = timeout;
        Ok(self)
    }

    pub fn backend_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::InvalidOption("backend timeout must be non-zero".into()));
        }
        self.backend_timeout = timeout;
        Ok(self)
    }

    pub fn max_payload_bytes(mut self, bytes: usize) -> Result<Self> {
        if bytes == 0 {
            return Err(Error::InvalidOption("max payload size must be non-zero".into()));
        }
        self.max_payload_bytes = bytes;
        Ok(self)
    }

    /// Try these format kinds first ("vtt", "srt", "json3", ...).
    pub fn prefer_formats<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefer_formats = kinds
            .into_iter()
            .map(|k| k.into().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn yt_dlp_path(mut self, path: PathBuf) -> Self {
        self.yt_dlp_path = Some(path);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Resolve the yt-dlp executable, defaulting to "yt-dlp" on PATH.
    pub fn resolve_yt_dlp(&self) -> PathBuf {
        self.yt_dlp_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("yt-dlp"))
    }
}
