//! Rule-based cleanup of raw engine output.
//!
//! The generation engine emits bookkeeping markers (a source label and
//! bracketed sentiment tags) that must never reach the user, and its raw
//! text carries no capitalization or punctuation guarantees. `sanitize`
//! turns that into displayable text without any model in the loop, so it
//! is always available as the pipeline's floor.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Source label the engine prefixes onto replies, e.g. `[NEXUS]: `.
    static ref SOURCE_TAG: Regex = Regex::new(r"(?i)\[nexus\]:\s*").unwrap();
    /// Bracketed sentiment annotations emitted alongside the text.
    static ref SENTIMENT_TAG: Regex =
        Regex::new(r"(?i)\[(?:positive|negative|neutral)\]").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r" {2,}").unwrap();
    static ref SPACE_BEFORE_PUNCT: Regex = Regex::new(r" ([.,!?])").unwrap();
}

/// Cleans a raw engine reply into user-presentable text.
///
/// Total and deterministic: any input produces a string, and an
/// all-marker or all-whitespace input produces `""`. The output ends in
/// `.`, `!` or `?` whenever it is non-empty.
pub fn sanitize(raw: &str) -> String {
    // Markers can be adjacent or nested, so removal repeats until a full
    // pass changes nothing.
    let mut text = raw.to_string();
    loop {
        let pass = SENTIMENT_TAG.replace_all(&text, "").into_owned();
        let pass = SOURCE_TAG.replace_all(&pass, "").into_owned();
        if pass == text {
            break;
        }
        text = pass;
    }

    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let text = capitalize_first(text);
    let text = ensure_terminal_punct(&text);
    let text = collapse_spaces(&text);
    tighten_punct(&text)
}

/// Uppercases the first character when it is a letter.
pub(crate) fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {
            let mut out = String::with_capacity(text.len());
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            out
        }
        _ => text.to_string(),
    }
}

/// Appends a period unless the text already ends in `.`, `!` or `?`.
pub(crate) fn ensure_terminal_punct(text: &str) -> String {
    match text.chars().last() {
        None | Some('.') | Some('!') | Some('?') => text.to_string(),
        _ => format!("{text}."),
    }
}

pub(crate) fn collapse_spaces(text: &str) -> String {
    MULTI_SPACE.replace_all(text, " ").into_owned()
}

/// Drops a stray space sitting in front of `.`, `,`, `!` or `?`.
pub(crate) fn tighten_punct(text: &str) -> String {
    SPACE_BEFORE_PUNCT.replace_all(text, "$1").into_owned()
}
