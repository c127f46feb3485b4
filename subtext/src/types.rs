use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One fetchable rendition of a subtitle track.
///
/// Field names follow the backend's JSON (`ext`, `url`, `name`). A missing
/// `url` is kept as `None` and treated as a failed candidate at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Format kind, e.g. "vtt", "srt", "json3".
    #[serde(rename = "ext", default)]
    pub kind: String,
    #[serde(rename = "url", default)]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FormatDescriptor {
    pub fn new(kind: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            location: Some(location.into()),
            name: None,
        }
    }
}

/// Insertion-ordered mapping of language tag to its available formats.
///
/// The first key matters: selection falls back to it when the requested
/// language is missing. Deserializing keeps the document order of the JSON
/// object. Re-inserting an existing key replaces its formats in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageMap {
    entries: Vec<(String, Vec<FormatDescriptor>)>,
}

impl LanguageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: impl Into<String>, formats: Vec<FormatDescriptor>) {
        let language = language.into();
        match self.entries.iter_mut().find(|(key, _)| *key == language) {
            Some((_, existing)) => *existing = formats,
            None => self.entries.push((language, formats)),
        }
    }

    pub fn get(&self, language: &str) -> Option<&[FormatDescriptor]> {
        self.entries
            .iter()
            .find(|(key, _)| key == language)
            .map(|(_, formats)| formats.as_slice())
    }

    pub fn contains(&self, language: &str) -> bool {
        self.get(language).is_some()
    }

    /// First inserted language and its formats.
    pub fn first(&self) -> Option<(&str, &[FormatDescriptor])> {
        self.entries
            .first()
            .map(|(key, formats)| (key.as_str(), formats.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FormatDescriptor])> {
        self.entries
            .iter()
            .map(|(key, formats)| (key.as_str(), formats.as_slice()))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<FormatDescriptor>)> for LanguageMap {
    fn from_iter<I: IntoIterator<Item = (K, Vec<FormatDescriptor>)>>(iter: I) -> Self {
        let mut map = LanguageMap::new();
        for (language, formats) in iter {
            map.insert(language, formats);
        }
        map
    }
}

impl Serialize for LanguageMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (language, formats) in &self.entries {
            map.serialize_entry(language, formats)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LanguageMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LanguageMapVisitor;

        impl<'de> Visitor<'de> for LanguageMapVisitor {
            type Value = LanguageMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of language tags to subtitle format lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = LanguageMap::new();
                while let Some((language, formats)) =
                    access.next_entry::<String, Vec<FormatDescriptor>>()?
                {
                    map.insert(language, formats);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(LanguageMapVisitor)
    }
}

/// Every subtitle track the backend offers for one video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCatalog {
    /// Human-authored subtitles.
    #[serde(default)]
    pub manual: LanguageMap,
    /// Machine-generated captions.
    #[serde(default)]
    pub automatic: LanguageMap,
}

impl SubtitleCatalog {
    pub fn new(manual: LanguageMap, automatic: LanguageMap) -> Self {
        Self { manual, automatic }
    }

    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.automatic.is_empty()
    }
}

/// Which selection fallback produced a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Manual subtitles in the requested language (or a regional variant).
    ManualRequested,
    /// Automatic captions in the requested language (or a regional variant).
    AutomaticRequested,
    /// First manual subtitle language, requested language unavailable.
    ManualFirst,
    /// First automatic caption language, requested language unavailable.
    AutomaticFirst,
}

impl Tier {
    /// Whether the track is in a language other than the requested one.
    pub fn is_fallback(self) -> bool {
        matches!(self, Tier::ManualFirst | Tier::AutomaticFirst)
    }

    pub fn is_automatic(self) -> bool {
        matches!(self, Tier::AutomaticRequested | Tier::AutomaticFirst)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::ManualRequested => "manual",
            Tier::AutomaticRequested => "automatic",
            Tier::ManualFirst => "manual (first available)",
            Tier::AutomaticFirst => "automatic (first available)",
        };
        f.write_str(s)
    }
}

/// Metadata the backend returns for a video URL.
#[derive(Debug, Clone, Default)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub catalog: SubtitleCatalog,
}

/// Complete extraction result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtitles {
    /// Normalized single-line text. Empty when nothing usable was found.
    pub text: String,
    pub requested_language: String,
    /// Language key of the track actually used.
    pub language: Option<String>,
    pub tier: Option<Tier>,
    /// Format kind of the descriptor that was fetched.
    pub format: Option<String>,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
}

impl Subtitles {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Format as JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Format as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
