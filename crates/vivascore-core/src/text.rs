//! Small text utilities shared by the analyzers.

/// Split text into trimmed, non-empty sentences on runs of `.`, `!` and `?`.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercased whitespace tokens with surrounding punctuation removed.
///
/// Tokens that are pure punctuation are dropped.
pub fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Round `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Clamp a score into `[0, 10]`.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 10.0)
}

/// Character offset of the byte index `byte` in `text`.
pub fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// The match at `start..end` (byte indices) with up to `context` characters
/// on either side, trimmed.
pub fn snippet(text: &str, start: usize, end: usize, context: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(context)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(context)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    text[from..to].trim().to_string()
}
