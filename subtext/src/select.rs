use tracing::{debug, info};

use crate::types::{FormatDescriptor, LanguageMap, SubtitleCatalog, Tier};

/// The track chosen for a request, borrowed from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub tier: Tier,
    /// Catalog key of the chosen track (may differ from the request).
    pub language: &'a str,
    pub formats: &'a [FormatDescriptor],
}

/// Pick one track from the catalog.
///
/// Tiers, first match wins:
/// 1. manual subtitles in the requested language or a `lang-*` variant
/// 2. automatic captions in the requested language or a `lang-*` variant
/// 3. the first manual subtitle language
/// 4. the first automatic caption language
///
/// Each mapping is matched with [`match_language`], whose first-key step
/// means automatic captions are only consulted when there are no manual
/// subtitles at all. The tier records whether the chosen key was a match for
/// the request or the mapping's first entry.
///
/// Returns `None` only when the catalog has no tracks at all.
pub fn select<'a>(catalog: &'a SubtitleCatalog, language: &str) -> Option<Selection<'a>> {
    let (mapping, requested_tier, first_tier) = if catalog.manual.is_empty() {
        (&catalog.automatic, Tier::AutomaticRequested, Tier::AutomaticFirst)
    } else {
        (&catalog.manual, Tier::ManualRequested, Tier::ManualFirst)
    };

    let (tier, (key, formats)) = match match_requested(mapping, language) {
        Some(hit) => (requested_tier, hit),
        None => (first_tier, match_language(mapping, language)?),
    };

    if tier.is_fallback() {
        info!(
            requested = language,
            using = key,
            source = %tier,
            "requested subtitle language not found, falling back"
        );
    } else {
        debug!(requested = language, using = key, source = %tier, "subtitle track selected");
    }

    Some(Selection {
        tier,
        language: key,
        formats,
    })
}

/// Match a language within one mapping: exact key, then the first
/// `lang-*` variant, then the mapping's first key.
///
/// Returns `None` only when the mapping is empty.
pub fn match_language<'a>(
    mapping: &'a LanguageMap,
    language: &str,
) -> Option<(&'a str, &'a [FormatDescriptor])> {
    match_requested(mapping, language).or_else(|| mapping.first())
}

/// Exact key (case-sensitive, then ASCII case-insensitive), then the first
/// key of the form `language-suffix`.
pub fn match_requested<'a>(
    mapping: &'a LanguageMap,
    language: &str,
) -> Option<(&'a str, &'a [FormatDescriptor])> {
    if language.is_empty() {
        return None;
    }

    mapping
        .iter()
        .find(|(key, _)| *key == language)
        .or_else(|| {
            mapping
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(language))
        })
        .or_else(|| mapping.iter().find(|(key, _)| is_variant_of(key, language)))
}

/// `en-US` is a variant of `en`; `en` and `eng` are not.
fn is_variant_of(key: &str, language: &str) -> bool {
    key.len() > language.len() + 1
        && key.as_bytes()[language.len()] == b'-'
        && key
            .get(..language.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(language))
}
