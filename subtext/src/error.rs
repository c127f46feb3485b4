use std::time::Duration;

/// All errors that can occur in subtext.
///
/// Only the upstream catalog lookup surfaces these to callers of the
/// extraction functions. Fetch failures for individual subtitle formats are
/// logged and skipped, and malformed payloads degrade to empty text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid URL (must start with http:// or https://): {0}")]
    InvalidUrl(String),

    #[error("invalid language code: \"{0}\" — expected 2-5 letters, digits or hyphens (e.g. \"en\", \"pt-br\")")]
    InvalidLanguage(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("subtitle backend error: {0}")]
    Upstream(String),

    #[cfg(feature = "download")]
    #[error("yt-dlp not found — install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("subtitle fetch failed: {0}")]
    Fetch(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
