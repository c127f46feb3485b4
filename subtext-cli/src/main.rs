use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use subtext::{CatalogSource, Error, ExtractOptions, HttpFetcher, YtDlp};

/// Exit code for no subtitles or a runtime failure.
const EXIT_FAILURE: i32 = 1;

/// Exit code for invalid input (URL or language).
const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "subtext",
    about = "Extract subtitles from a video URL as plain text",
    after_help = "Examples:\n  subtext \"https://www.youtube.com/watch?v=dQw4w9WgXcQ\"\n  subtext \"https://example.com/video\" --language es\n  subtext \"https://example.com/video\" > subtitles.txt"
)]
struct Cli {
    /// Video URL to extract subtitles from.
    url: String,

    /// Language code for subtitles (e.g. "en", "pt-br").
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Output format.
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Write output to file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Subtitle format to try first (repeatable, e.g. --prefer-format vtt).
    #[arg(long = "prefer-format", value_name = "KIND")]
    prefer_formats: Vec<String>,

    /// Per-format download timeout in seconds.
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Path to the yt-dlp executable.
    #[arg(long, value_name = "PATH")]
    yt_dlp: Option<PathBuf>,

    /// List available subtitle tracks instead of extracting.
    #[arg(long)]
    list_tracks: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Hide the progress spinner.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "subtext=info" } else { "subtext=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = subtext::validate_url(&cli.url) {
        eprintln!("Error: {e}");
        std::process::exit(EXIT_USAGE);
    }

    let mut opts = match ExtractOptions::new()
        .language(&cli.language)
        .and_then(|o| o.fetch_timeout(Duration::from_secs(cli.timeout)))
    {
        Ok(o) => o.prefer_formats(cli.prefer_formats.iter()),
        Err(e @ Error::InvalidLanguage(_)) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_USAGE);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };
    if let Some(path) = cli.yt_dlp.clone() {
        opts = opts.yt_dlp_path(path);
    }

    let spinner = spinner(cli.quiet, &cli.url);

    if cli.list_tracks {
        let result = YtDlp::new(&opts).lookup(&cli.url).await;
        spinner.finish_and_clear();
        match result {
            Ok(info) => {
                print_tracks("Manual subtitles", &info.catalog.manual);
                print_tracks("Automatic captions", &info.catalog.automatic);
            }
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(EXIT_FAILURE);
            }
        }
        return;
    }

    let result = match HttpFetcher::new(&opts) {
        Ok(fetcher) => subtext::extract_with(&YtDlp::new(&opts), &fetcher, &cli.url, &opts).await,
        Err(e) => Err(e),
    };
    spinner.finish_and_clear();

    let subs = match result {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to extract subtitles: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    if subs.is_empty() {
        eprintln!(
            "Error: No subtitles found for language '{}' at {}",
            subs.requested_language, cli.url
        );
        std::process::exit(EXIT_FAILURE);
    }

    if let (Some(language), Some(tier)) = (&subs.language, subs.tier) {
        if tier.is_fallback() {
            eprintln!(
                "Note: '{}' not available, using {tier} subtitles in '{language}'",
                subs.requested_language
            );
        }
    }

    let output_text = match cli.format {
        OutputFormat::Text => format!("{}\n", subs.text),
        OutputFormat::Json => match subs.to_json_pretty() {
            Ok(j) => format!("{j}\n"),
            Err(e) => {
                eprintln!("JSON error: {e}");
                std::process::exit(EXIT_FAILURE);
            }
        },
    };

    match cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &output_text) {
                eprintln!("Error writing to {}: {e}", path.display());
                std::process::exit(EXIT_FAILURE);
            }
            if cli.verbose {
                eprintln!("Written {} characters to {}", subs.text.len(), path.display());
            }
        }
        None => print!("{output_text}"),
    }
}

fn spinner(quiet: bool, url: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Fetching subtitles for {url}"));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_tracks(heading: &str, tracks: &subtext::LanguageMap) {
    println!("{heading}:");
    if tracks.is_empty() {
        println!("  (none)");
        return;
    }
    println!("  {:<12} FORMATS", "LANGUAGE");
    for (language, formats) in tracks.iter() {
        let kinds: Vec<&str> = formats.iter().map(|f| f.kind.as_str()).collect();
        println!("  {language:<12} {}", kinds.join(", "));
    }
}
