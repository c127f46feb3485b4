//! Subtitle extraction library: video URL in, clean plain-text subtitles out.
//!
//! **subtext** looks up the subtitle tracks of a video (via yt-dlp), picks the
//! best track for the requested language, downloads it, and flattens the
//! WebVTT, SRT or JSON caption payload into one line of readable text.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> subtext::Result<()> {
//! let subs = subtext::extract_subtitles("https://example.com/video").await?;
//! if subs.is_empty() {
//!     eprintln!("no subtitles");
//! } else {
//!     println!("{}", subs.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The pure stages are usable on their own: [`select()`] picks a track from a
//! [`SubtitleCatalog`] and [`normalize()`] cleans a payload.

pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod select;
pub mod source;
pub mod types;
#[cfg(feature = "download")]
pub mod ytdlp;

pub use config::{ExtractOptions, Language};
pub use error::{Error, Result};
pub use fetch::{Fetch, HttpFetcher};
pub use normalize::{detect_format, normalize, PayloadFormat};
pub use select::{select, Selection};
pub use source::{validate_url, CatalogSource};
pub use types::{FormatDescriptor, LanguageMap, Subtitles, SubtitleCatalog, Tier, VideoInfo};
#[cfg(feature = "download")]
pub use ytdlp::YtDlp;

use tracing::{info, warn};

/// How a piece of subtitle text was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub tier: Tier,
    /// Catalog language key of the track used.
    pub language: String,
    /// Format kind of the descriptor that was fetched.
    pub format: String,
    pub text: String,
}

/// Select, fetch and normalize subtitles from a catalog.
///
/// Returns an empty string when the catalog has no tracks, when every format
/// of the chosen track fails to download, or when the payload holds no text.
pub async fn resolve_and_clean<F: Fetch>(
    catalog: &SubtitleCatalog,
    language: &str,
    fetcher: &F,
) -> String {
    let options = ExtractOptions::default();
    resolve(catalog, language, fetcher, &options)
        .await
        .map(|r| r.text)
        .unwrap_or_default()
}

/// Like [`resolve_and_clean`], reporting which track and format were used.
///
/// `language` is taken as given; [`ExtractOptions::language`] is ignored here.
/// Returns `None` when no track could be selected or fetched.
pub async fn resolve<F: Fetch>(
    catalog: &SubtitleCatalog,
    language: &str,
    fetcher: &F,
    options: &ExtractOptions,
) -> Option<Resolution> {
    let Some(selection) = select(catalog, language) else {
        info!(requested = language, "no subtitle tracks available");
        return None;
    };

    let ordered: Vec<FormatDescriptor> =
        fetch::order_by_preference(selection.formats, &options.prefer_formats)
            .into_iter()
            .cloned()
            .collect();

    let Some((descriptor, payload)) = fetch::fetch(&ordered, fetcher, options.fetch_timeout).await
    else {
        warn!(
            language = selection.language,
            formats = ordered.len(),
            "every subtitle format failed to download"
        );
        return None;
    };

    let text = normalize(&payload);
    info!(
        language = selection.language,
        format = %descriptor.kind,
        chars = text.len(),
        "subtitles extracted"
    );

    Some(Resolution {
        tier: selection.tier,
        language: selection.language.to_string(),
        format: descriptor.kind.clone(),
        text,
    })
}

/// Extract subtitles from a URL in English with default options.
#[cfg(feature = "download")]
pub async fn extract_subtitles(url: &str) -> Result<Subtitles> {
    extract_subtitles_with_options(url, &ExtractOptions::default()).await
}

/// Extract subtitles from a URL with custom options, using yt-dlp and HTTP.
#[cfg(feature = "download")]
pub async fn extract_subtitles_with_options(
    url: &str,
    options: &ExtractOptions,
) -> Result<Subtitles> {
    let source = YtDlp::new(options);
    let fetcher = HttpFetcher::new(options)?;
    extract_with(&source, &fetcher, url, options).await
}

/// Extract subtitles with an explicit catalog source and fetcher.
///
/// Errors only for an invalid URL or a failed catalog lookup. Missing
/// subtitles yield `Ok` with empty text.
pub async fn extract_with<S: CatalogSource, F: Fetch>(
    source: &S,
    fetcher: &F,
    url: &str,
    options: &ExtractOptions,
) -> Result<Subtitles> {
    validate_url(url)?;
    let url = url.trim();

    let info = source.lookup(url).await?;
    let requested = options.language.code();
    let resolution = resolve(&info.catalog, requested, fetcher, options).await;

    if resolution.as_ref().is_none_or(|r| r.text.is_empty()) {
        info!(%url, language = requested, "no usable subtitles found");
    }

    let (text, language, tier, format) = match resolution {
        Some(r) => (r.text, Some(r.language), Some(r.tier), Some(r.format)),
        None => (String::new(), None, None, None),
    };

    Ok(Subtitles {
        text,
        requested_language: requested.to_string(),
        language,
        tier,
        format,
        source_url: Some(url.to_string()),
        source_title: info.title,
    })
}
