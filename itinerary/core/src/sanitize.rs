//! Trailer sanitizing
//!
//! Models often wrap structured output in a Markdown code fence even when
//! told not to. This strips surrounding whitespace and one or more wrapping
//! fences (` ```json ... ``` `) so the remainder can be handed to the JSON
//! parser. Fences inside the content are left alone.

const FENCE: &str = "```";

/// Strip whitespace and wrapping code fences from a raw trailer
///
/// Idempotent: sanitizing already-clean text returns it unchanged.
#[must_use]
pub fn sanitize(trailer: &str) -> &str {
    let mut current = trailer.trim();

    loop {
        let stripped = strip_closing_fence(strip_opening_fence(current)).trim();
        if stripped.len() == current.len() {
            return current;
        }
        current = stripped;
    }
}

/// Remove a leading fence and its optional language tag
fn strip_opening_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(rest.len());
    &rest[tag_len..]
}

/// Remove a trailing fence
fn strip_closing_fence(text: &str) -> &str {
    text.strip_suffix(FENCE).unwrap_or(text)
}
