use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ExtractOptions;
use crate::error::{Error, Result};
use crate::source::{validate_url, CatalogSource};
use crate::types::{LanguageMap, SubtitleCatalog, VideoInfo};

/// Longest stderr excerpt carried into an error message.
const MAX_STDERR_CHARS: usize = 1000;

#[derive(Deserialize)]
struct YtDlpInfo {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    subtitles: Option<LanguageMap>,
    #[serde(default)]
    automatic_captions: Option<LanguageMap>,
}

/// Subtitle catalog lookup through the yt-dlp executable.
///
/// # Security
/// - URL is validated to start with http:// or https://
/// - Arguments are passed via `.arg()` (no shell expansion)
/// - `--no-exec` prevents yt-dlp from running post-processing commands
/// - `--skip-download` keeps it to metadata only
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(options: &ExtractOptions) -> Self {
        Self {
            program: options.resolve_yt_dlp(),
            timeout: options.backend_timeout,
        }
    }

    async fn dump_json(&self, url: &str) -> Result<Vec<u8>> {
        let child = tokio::process::Command::new(&self.program)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-exec",
                "--no-warnings",
            ])
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::YtDlpNotFound)
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(Error::Timeout(self.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Limit error message length to avoid dumping huge stderr
            let stderr_truncated: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            return Err(Error::Upstream(format!(
                "yt-dlp failed ({}): {stderr_truncated}",
                output.status
            )));
        }

        Ok(output.stdout)
    }
}

impl CatalogSource for YtDlp {
    fn lookup(&self, url: &str) -> impl Future<Output = Result<VideoInfo>> + Send {
        let url = url.trim().to_string();
        async move {
            validate_url(&url)?;
            info!(%url, "looking up subtitle tracks");

            let stdout = self.dump_json(&url).await?;
            let info = parse_info(&stdout)?;

            debug!(
                manual = info.catalog.manual.len(),
                automatic = info.catalog.automatic.len(),
                title = info.title.as_deref().unwrap_or_default(),
                "subtitle catalog loaded"
            );
            Ok(info)
        }
    }
}

/// Parse yt-dlp `--dump-json` output.
///
/// Playlist URLs print one object per line; only the first is used.
pub fn parse_info(json: &[u8]) -> Result<VideoInfo> {
    let info: YtDlpInfo = serde_json::Deserializer::from_slice(json)
        .into_iter::<YtDlpInfo>()
        .next()
        .ok_or_else(|| Error::Upstream("yt-dlp printed no metadata".into()))??;

    Ok(VideoInfo {
        id: info.id,
        title: info.title,
        catalog: SubtitleCatalog::new(
            info.subtitles.unwrap_or_default(),
            info.automatic_captions.unwrap_or_default(),
        ),
    })
}
