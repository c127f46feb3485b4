//! Subtitle payload to plain text.
//!
//! Payloads are either a JSON caption-event stream (`{"events": [{"segs":
//! [{"utf8": ...}]}]}`) or cue markup (WebVTT/SRT). Both end in the same
//! cleanup pass that flattens everything to one line and fixes punctuation
//! spacing. Timing is discarded.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Payload shape, decided by [`detect_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// JSON caption events (json3).
    Json,
    /// WebVTT or SRT cue markup.
    Markup,
}

static VTT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^WEBVTT.*?\r?\n\r?\n").unwrap());

static CUE_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}:\d{2}:\d{2}[,.]\d{3}\s*-->\s*\d{2}:\d{2}:\d{2}[,.]\d{3}").unwrap()
});

static SEQUENCE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\d+\s*$").unwrap());

static INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]+\}").unwrap());

static CUE_SETTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"position:\d+%|align:[a-zA-Z]+|size:\d+%").unwrap());

// Commas are left to the punctuation spacing pass.
static STRUCTURAL_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\[\]{}"']"#).unwrap());

static JSON_KEY_RESIDUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"wsWinStyles|wpWinPositions|events").unwrap());

static PUNCTUATION_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[\s\[\]{},"':]+$"#).unwrap());

static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n]+").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static SPACE_BEFORE_STOP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+([.!?])").unwrap());

static MISSING_SPACE_AFTER_STOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])(\S)").unwrap());

static SPACE_BEFORE_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+(,)").unwrap());

static MISSING_SPACE_AFTER_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(,)(\S)").unwrap());

#[derive(Deserialize)]
struct CaptionEvents {
    events: Vec<serde_json::Value>,
}

/// Sniff the payload format.
///
/// JSON when the trimmed payload opens with `{` or mentions `"events"`
/// anywhere; markup otherwise. The check is heuristic, so a JSON verdict is
/// only a first attempt: [`normalize`] falls back to markup when parsing fails.
pub fn detect_format(payload: &str) -> PayloadFormat {
    if payload.trim_start().starts_with('{') || payload.contains("\"events\"") {
        PayloadFormat::Json
    } else {
        PayloadFormat::Markup
    }
}

/// Turn a raw subtitle payload into a single line of clean text.
///
/// Never fails: unrecognized markup is left in place and an unusable payload
/// yields an empty string.
pub fn normalize(payload: &str) -> String {
    if payload.is_empty() {
        return String::new();
    }

    if detect_format(payload) == PayloadFormat::Json {
        match json_caption_text(payload) {
            Some(text) => return text,
            None => debug!("payload looked like JSON captions but did not parse, cleaning as markup"),
        }
    }

    clean_markup(payload)
}

/// Text of a JSON caption-event payload, or `None` when the payload is not
/// an object with an `events` array.
fn json_caption_text(payload: &str) -> Option<String> {
    let parsed: CaptionEvents = serde_json::from_str(payload).ok()?;

    let fragments: Vec<&str> = parsed
        .events
        .iter()
        .filter_map(|event| event.get("segs")?.as_array())
        .flatten()
        .filter_map(|seg| seg.get("utf8")?.as_str())
        .collect();

    let joined = fragments.join(" ");
    let stripped = INLINE_TAG.replace_all(&joined, "");
    let stripped = STYLE_BLOCK.replace_all(&stripped, "");
    Some(cleanup(&stripped))
}

/// Strip WebVTT/SRT structure, then clean up.
fn clean_markup(payload: &str) -> String {
    let content = VTT_HEADER.replace_all(payload, "");
    let content = CUE_TIMING.replace_all(&content, "");
    let content = SEQUENCE_NUMBER.replace_all(&content, "");
    let content = INLINE_TAG.replace_all(&content, "");
    let content = STYLE_BLOCK.replace_all(&content, "");
    let content = CUE_SETTING.replace_all(&content, "");
    let content = STRUCTURAL_CHARS.replace_all(&content, "");
    let content = JSON_KEY_RESIDUE.replace_all(&content, "");
    cleanup(&content)
}

/// Flatten to one line, normalize whitespace and punctuation spacing.
///
/// Runs after all structural stripping so removed timestamps and tags can't
/// leave punctuation spacing behind.
fn cleanup(text: &str) -> String {
    let joined = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !PUNCTUATION_ONLY.is_match(line))
        .collect::<Vec<_>>()
        .join(" ");

    let text = LINE_BREAKS.replace_all(&joined, " ");
    let text = WHITESPACE.replace_all(&text, " ");

    let text = SPACE_BEFORE_STOP.replace_all(&text, "${1}");
    let text = MISSING_SPACE_AFTER_STOP.replace_all(&text, "${1} ${2}");
    let text = SPACE_BEFORE_COMMA.replace_all(&text, "${1}");
    let text = MISSING_SPACE_AFTER_COMMA.replace_all(&text, "${1} ${2}");

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}
