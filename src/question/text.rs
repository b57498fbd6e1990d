//! Transcript text cleanup and normalisation.

use std::sync::LazyLock;

use regex::Regex;

/// Filler tokens stripped before consolidation: elongated "ê" vowels and the
/// "hum"/"ahn" hesitation sounds, case-insensitive.
static FILLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ê+|hum|ahn").unwrap_or_else(|e| panic!("filler regex: {e}")));

/// Strip filler tokens from a raw transcript fragment and trim the result.
///
/// ```rust
/// use meeting_copilot::question::clean_transcript;
///
/// assert_eq!(clean_transcript("hum what is êêê a mutex"), "what is  a mutex");
/// assert_eq!(clean_transcript("  ahn  "), "");
/// ```
pub fn clean_transcript(raw: &str) -> String {
    FILLER.replace_all(raw, "").trim().to_string()
}

/// Normalise text for duplicate comparison: casefold, drop terminal
/// punctuation and line breaks, collapse runs of whitespace.
///
/// Used both for duplicate-history suppression at promotion and for the
/// same-question dispatch guard.
pub fn normalize_for_compare(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !matches!(c, '?' | '!' | '.' | '\n' | '\r'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
