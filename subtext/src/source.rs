use std::future::Future;

use url::Url;

use crate::error::{Error, Result};
use crate::types::VideoInfo;

/// Looks up the subtitle catalog of a video URL.
///
/// Errors here are transport-level failures of the backend and are reported
/// to the caller, unlike missing or broken subtitles which degrade to empty
/// text.
pub trait CatalogSource {
    fn lookup(&self, url: &str) -> impl Future<Output = Result<VideoInfo>> + Send;
}

/// Validate that a string looks like a URL.
/// Rejects anything that isn't http:// or https:// with a non-empty host.
pub fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    let invalid = || Error::InvalidUrl(trimmed.to_string());

    if !trimmed.starts_with("https://") && !trimmed.starts_with("http://") {
        return Err(invalid());
    }

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_https() {
        assert!(validate_url("https://youtube.com/watch?v=abc").is_ok());
    }

    #[test]
    fn test_validate_url_http() {
        assert!(validate_url("http://example.com/video").is_ok());
    }

    #[test]
    fn test_validate_url_trims_whitespace() {
        assert!(validate_url("  https://youtu.be/qF3ua2_Cx0o\n").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_no_scheme() {
        assert!(validate_url("youtube.com/watch?v=abc").is_err());
    }

    #[test]
    fn test_validate_url_rejects_missing_host() {
        assert!(validate_url("https://").is_err());
        assert!(validate_url("http://?q=1").is_err());
        assert!(validate_url("https://@").is_err());
        assert!(validate_url("https://:80").is_err());
        assert!(validate_url("https://user@/watch").is_err());
    }

    #[test]
    fn test_validate_url_accepts_port_and_userinfo() {
        assert!(validate_url("http://localhost:8080/v.mp4").is_ok());
        assert!(validate_url("https://user@example.com/v").is_ok());
        assert!(validate_url("https://[::1]/v").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_file_scheme() {
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_validate_url_rejects_empty() {
        assert!(matches!(validate_url(""), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_url_rejects_command() {
        assert!(validate_url("$(whoami)").is_err());
        assert!(validate_url("https://exa mple.com").is_err());
    }
}
