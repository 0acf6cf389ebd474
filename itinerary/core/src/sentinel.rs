//! Sentinel Matcher
//!
//! Incremental partial-match automaton for the literal that separates the
//! narrative from the structured trailer in a model response.
//!
//! The matcher is fed one byte at a time and remembers how many trailing
//! bytes of everything it has seen form a prefix of the sentinel. Those bytes
//! are "unconfirmed": they may still become part of the sentinel, so the
//! decoder must hold them back instead of releasing them as narrative.
//!
//! Work is linear in the total input length, no matter how the input is
//! chunked, because the failure table lets a mismatch fall back to the next
//! shorter candidate without re-scanning earlier input.

/// The literal separating narrative from the JSON trailer
pub const SENTINEL: &str = "---JSON_DATA---";

/// Partial-match automaton over a fixed literal
#[derive(Clone, Debug)]
pub struct SentinelMatcher {
    /// Literal being searched for
    pattern: &'static [u8],
    /// `failure[i]` is the length of the longest proper border of `pattern[..=i]`
    failure: Vec<usize>,
    /// Length of the longest suffix of scanned input that is a prefix of `pattern`
    matched: usize,
}

impl SentinelMatcher {
    /// Create a matcher for `pattern`
    ///
    /// An empty pattern never matches.
    #[must_use]
    pub fn new(pattern: &'static str) -> Self {
        let pattern = pattern.as_bytes();
        Self {
            pattern,
            failure: failure_table(pattern),
            matched: 0,
        }
    }

    /// Length of the literal in bytes
    #[must_use]
    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    /// Advance the automaton by one byte
    ///
    /// Returns `true` when this byte completes the literal. Once complete the
    /// matcher stays complete until [`reset`](Self::reset).
    pub fn advance(&mut self, byte: u8) -> bool {
        if self.pattern.is_empty() {
            return false;
        }
        if self.is_complete() {
            return true;
        }

        while self.matched > 0 && self.pattern[self.matched] != byte {
            self.matched = self.failure[self.matched - 1];
        }
        if self.pattern[self.matched] == byte {
            self.matched += 1;
        }

        self.is_complete()
    }

    /// Whether the full literal has been seen
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.pattern.is_empty() && self.matched == self.pattern.len()
    }

    /// Number of trailing bytes that might still turn out to be the literal
    ///
    /// Zero once the literal is complete: the matched bytes are then consumed,
    /// not pending.
    #[must_use]
    pub fn unconfirmed(&self) -> usize {
        if self.is_complete() {
            0
        } else {
            self.matched
        }
    }

    /// Forget all scanned input
    pub fn reset(&mut self) {
        self.matched = 0;
    }
}

impl Default for SentinelMatcher {
    fn default() -> Self {
        Self::new(SENTINEL)
    }
}

/// Classic prefix-function table
fn failure_table(pattern: &[u8]) -> Vec<usize> {
    let mut failure = vec![0; pattern.len()];
    let mut border = 0;

    for i in 1..pattern.len() {
        while border > 0 && pattern[i] != pattern[border] {
            border = failure[border - 1];
        }
        if pattern[i] == pattern[border] {
            border += 1;
        }
        failure[i] = border;
    }

    failure
}
