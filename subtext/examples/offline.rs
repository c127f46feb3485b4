//! Select and clean subtitles from an in-memory catalog, no network needed.
//!
//! Usage: cargo run --example offline

use std::collections::HashMap;
use std::future::Future;

use subtext::{Fetch, FormatDescriptor, LanguageMap, SubtitleCatalog};

struct Canned(HashMap<&'static str, &'static str>);

impl Fetch for Canned {
    fn fetch(&self, location: &str) -> impl Future<Output = subtext::Result<String>> + Send {
        let result = self
            .0
            .get(location)
            .map(|s| s.to_string())
            .ok_or_else(|| subtext::Error::Fetch(format!("unknown location {location}")));
        async move { result }
    }
}

#[tokio::main]
async fn main() {
    let mut automatic = LanguageMap::new();
    automatic.insert(
        "fr",
        vec![FormatDescriptor::new("vtt", "mem://fr.vtt")],
    );
    let catalog = SubtitleCatalog::new(LanguageMap::new(), automatic);

    let fetcher = Canned(HashMap::from([(
        "mem://fr.vtt",
        "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n<c>Bonjour</c> , tout le monde\n",
    )]));

    let text = subtext::resolve_and_clean(&catalog, "en", &fetcher).await;
    println!("{text}");
}
