//! Text segmenter: document body → sentences → normalized tokens.
//!
//! Pure functions with no engine state. The body is NFC-normalized, split on
//! sentence terminators, stripped of a few joining punctuation marks,
//! lowercased, and split on whitespace.

use unicode_normalization::UnicodeNormalization;

/// Characters that end a sentence.
pub const TERMINATORS: [char; 4] = ['.', '!', '?', ';'];

/// Characters removed from inside a sentence before tokenizing.
pub const STRIPPED: [char; 3] = ['-', ':', ','];

/// Split a document body into sentences of normalized tokens.
///
/// Sentences with no tokens are dropped, so an empty body yields no
/// sentences. A one-word sentence is kept.
pub fn sentences(body: &str) -> Vec<Vec<String>> {
    let normalized: String = body.nfc().collect();
    normalized
        .split(TERMINATORS)
        .map(tokenize)
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

/// Normalize and tokenize a single sentence.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let cleaned: String = sentence
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .flat_map(char::to_lowercase)
        .collect();
    cleaned.split_whitespace().map(str::to_owned).collect()
}

/// Canonical text of a segmented body, used as a document's content key.
///
/// Two bodies that segment identically share the same key.
pub fn canonical_text(sentences: &[Vec<String>]) -> String {
    sentences
        .iter()
        .map(|s| s.join(" "))
        .collect::<Vec<_>>()
        .join(". ")
}
