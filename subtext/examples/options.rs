//! Extract subtitles in a chosen language, preferring WebVTT, and print the
//! result as JSON.
//!
//! Usage: cargo run --example options -- https://example.com/video de

use std::time::Duration;

use subtext::ExtractOptions;

#[tokio::main]
async fn main() -> subtext::Result<()> {
    let mut args = std::env::args().skip(1);
    let url = args.next().expect("usage: options <video-url> [language]");
    let language = args.next().unwrap_or_else(|| "en".into());

    let opts = ExtractOptions::new()
        .language(&language)?
        .fetch_timeout(Duration::from_secs(10))?
        .prefer_formats(["vtt", "srt"]);

    let subs = subtext::extract_subtitles_with_options(&url, &opts).await?;

    println!("{}", subs.to_json_pretty()?);

    Ok(())
}
