//! Stream Decoder
//!
//! Splits a streamed model response into two channels:
//!
//! ```text
//!   fragments ──► [ pending tail ] ──► narrative (released incrementally)
//!                        │
//!                  sentinel seen
//!                        ▼
//!                     trailer (accumulated until finish)
//! ```
//!
//! Narrative is append-only: a segment returned from [`StreamDecoder::feed`]
//! is never revised. To keep that promise the decoder holds back the bytes
//! that could still be the start of the sentinel and releases them only once
//! the next fragment proves otherwise (or the stream ends).
//!
//! Output does not depend on how the input was chunked: feeding any partition
//! of a response yields the same narrative and trailer as feeding it whole.

use tracing::debug;

use crate::sentinel::SentinelMatcher;

/// Final result of decoding one response
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedStream {
    /// Everything before the sentinel (or the whole input if none was found)
    pub narrative: String,
    /// Everything after the sentinel, `None` if the sentinel never appeared
    pub trailer: Option<String>,
    /// Narrative released by `finish` that was never returned from `feed`
    pub final_segment: Option<String>,
}

impl DecodedStream {
    /// Whether a trailer channel was opened
    #[must_use]
    pub fn has_trailer(&self) -> bool {
        self.trailer.is_some()
    }
}

/// Incremental narrative/trailer splitter
#[derive(Clone, Debug, Default)]
pub struct StreamDecoder {
    matcher: SentinelMatcher,
    /// Bytes held back because they may still be the start of the sentinel
    pending: String,
    /// Narrative released so far
    narrative: String,
    /// Trailer accumulated after the sentinel
    trailer: Option<String>,
    /// Total bytes fed, for diagnostics
    bytes_fed: usize,
}

impl StreamDecoder {
    /// Create a decoder for the standard sentinel
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder around a custom matcher
    #[must_use]
    pub fn with_matcher(matcher: SentinelMatcher) -> Self {
        Self {
            matcher,
            ..Self::default()
        }
    }

    /// Feed the next fragment
    ///
    /// Returns the narrative text this fragment made safe to display, or
    /// `None` if nothing new can be released yet. After the sentinel has been
    /// seen every fragment goes to the trailer and `None` is returned.
    pub fn feed(&mut self, fragment: &str) -> Option<String> {
        self.bytes_fed += fragment.len();

        if let Some(trailer) = self.trailer.as_mut() {
            trailer.push_str(fragment);
            return None;
        }

        for (idx, byte) in fragment.bytes().enumerate() {
            if self.matcher.advance(byte) {
                return self.split_at_sentinel(fragment, idx + 1);
            }
        }

        // Sentinel bytes are ASCII, so the held-back tail always starts on a
        // char boundary.
        let hold = self.matcher.unconfirmed();
        self.pending.push_str(fragment);
        let release_len = self.pending.len() - hold;
        if release_len == 0 {
            return None;
        }

        let tail = self.pending.split_off(release_len);
        let segment = std::mem::replace(&mut self.pending, tail);
        self.narrative.push_str(&segment);
        Some(segment)
    }

    /// The sentinel ended at byte `end` of `fragment`
    fn split_at_sentinel(&mut self, fragment: &str, end: usize) -> Option<String> {
        let sentinel_len = self.matcher.pattern_len();

        let mut scanned = std::mem::take(&mut self.pending);
        scanned.push_str(&fragment[..end]);
        scanned.truncate(scanned.len() - sentinel_len);

        self.trailer = Some(fragment[end..].to_string());
        debug!(
            narrative_bytes = self.narrative.len() + scanned.len(),
            offset = self.bytes_fed - fragment.len() + end,
            "Sentinel confirmed"
        );

        if scanned.is_empty() {
            return None;
        }
        self.narrative.push_str(&scanned);
        Some(scanned)
    }

    /// Whether the sentinel has been confirmed
    #[must_use]
    pub fn sentinel_found(&self) -> bool {
        self.trailer.is_some()
    }

    /// Narrative released so far
    #[must_use]
    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    /// Bytes held back pending a possible sentinel
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Total bytes fed so far
    #[must_use]
    pub fn bytes_fed(&self) -> usize {
        self.bytes_fed
    }

    /// End the stream
    ///
    /// Any held-back tail can no longer complete the sentinel, so it is
    /// flushed as narrative. A missing sentinel is a normal outcome.
    #[must_use]
    pub fn finish(mut self) -> DecodedStream {
        let final_segment = if self.pending.is_empty() {
            None
        } else {
            let tail = std::mem::take(&mut self.pending);
            self.narrative.push_str(&tail);
            Some(tail)
        };

        debug!(
            narrative_bytes = self.narrative.len(),
            trailer_bytes = self.trailer.as_ref().map(String::len),
            "Stream decoded"
        );

        DecodedStream {
            narrative: self.narrative,
            trailer: self.trailer,
            final_segment,
        }
    }
}

/// Decode a complete response in one call
#[must_use]
pub fn decode_all(response: &str) -> DecodedStream {
    let mut decoder = StreamDecoder::new();
    let _ = decoder.feed(response);
    decoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const PAYLOAD: &str = r#"{"title":"T","destination":"D","duration":"2 days","locations":[{"name":"Wat","lat":18.7,"lng":99.0}]}"#;

    /// Feed fragments and collect everything released, including the final flush
    fn run(fragments: &[&str]) -> (String, DecodedStream) {
        let mut decoder = StreamDecoder::new();
        let mut released = String::new();
        for fragment in fragments {
            if let Some(segment) = decoder.feed(fragment) {
                released.push_str(&segment);
            }
        }
        let decoded = decoder.finish();
        if let Some(tail) = &decoded.final_segment {
            released.push_str(tail);
        }
        (released, decoded)
    }

    #[test]
    fn test_example_scenario() {
        let (released, decoded) = run(&[
            "Day 1: Temple.\n",
            "Day 2: Market.\n---JSO",
            "N_DATA---",
            PAYLOAD,
        ]);

        assert_eq!(decoded.narrative, "Day 1: Temple.\nDay 2: Market.\n");
        assert_eq!(released, decoded.narrative);
        assert_eq!(decoded.trailer.as_deref(), Some(PAYLOAD));
        assert_eq!(decoded.final_segment, None);
    }

    #[test]
    fn test_partial_sentinel_is_held_back() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(
            decoder.feed("Day 2: Market.\n---JSO").as_deref(),
            Some("Day 2: Market.\n")
        );
        assert_eq!(decoder.pending(), "---JSO");
        assert_eq!(decoder.feed("N_DATA---"), None);
        assert!(decoder.sentinel_found());
        assert_eq!(decoder.pending(), "");
    }

    const SENTINEL_LEN: usize = crate::SENTINEL.len();

    #[test]
    fn test_sentinel_split_at_midpoint() {
        let mid = SENTINEL_LEN / 2;
        let first = format!("Plan\n{}", &crate::SENTINEL[..mid]);
        let second = format!("{}{}", &crate::SENTINEL[mid..], PAYLOAD);

        let (_, decoded) = run(&[first.as_str(), second.as_str()]);
        assert_eq!(decoded.narrative, "Plan\n");
        assert_eq!(decoded.trailer.as_deref(), Some(PAYLOAD));
    }

    #[test]
    fn test_unfinished_prefix_is_flushed_at_end() {
        let (released, decoded) = run(&["Enjoy the trip!\n---JSON_DA"]);

        assert_eq!(decoded.narrative, "Enjoy the trip!\n---JSON_DA");
        assert_eq!(decoded.final_segment.as_deref(), Some("---JSON_DA"));
        assert_eq!(released, decoded.narrative);
        assert!(!decoded.has_trailer());
    }

    #[test]
    fn test_no_sentinel_returns_whole_input() {
        let decoded = decode_all("Just a plan with no data.");
        assert_eq!(decoded.narrative, "Just a plan with no data.");
        assert_eq!(decoded.trailer, None);
    }

    #[test]
    fn test_sentinel_at_start_gives_empty_narrative() {
        let (released, decoded) = run(&["---JSON_DATA---", "{}"]);
        assert_eq!(released, "");
        assert_eq!(decoded.narrative, "");
        assert_eq!(decoded.trailer.as_deref(), Some("{}"));
    }

    #[test]
    fn test_sentinel_at_end_gives_empty_trailer() {
        let decoded = decode_all("Plan\n---JSON_DATA---");
        assert_eq!(decoded.narrative, "Plan\n");
        assert_eq!(decoded.trailer.as_deref(), Some(""));
    }

    #[test]
    fn test_only_first_sentinel_splits() {
        let decoded = decode_all("A---JSON_DATA---B---JSON_DATA---C");
        assert_eq!(decoded.narrative, "A");
        assert_eq!(decoded.trailer.as_deref(), Some("B---JSON_DATA---C"));
    }

    #[test]
    fn test_markdown_rules_pass_through() {
        let (released, decoded) = run(&["# Day 1\n--", "-\n## Day 2\n"]);
        assert_eq!(decoded.narrative, "# Day 1\n---\n## Day 2\n");
        assert_eq!(released, decoded.narrative);
    }

    #[test]
    fn test_multibyte_text_around_sentinel() {
        let (released, decoded) = run(&["วัดพระธาตุ 🌄\n---JS", "ON_DATA---{\"a\":\"ตลาด\"}"]);
        assert_eq!(decoded.narrative, "วัดพระธาตุ 🌄\n");
        assert_eq!(released, decoded.narrative);
        assert_eq!(decoded.trailer.as_deref(), Some("{\"a\":\"ตลาด\"}"));
    }

    #[test]
    fn test_empty_fragments_are_harmless() {
        let (_, decoded) = run(&["", "Plan", "", "---JSON_DATA---", "", "{}"]);
        assert_eq!(decoded.narrative, "Plan");
        assert_eq!(decoded.trailer.as_deref(), Some("{}"));
    }

    #[test]
    fn test_bytes_fed_counts_everything() {
        let mut decoder = StreamDecoder::new();
        let _ = decoder.feed("abc---JSON_DATA---");
        let _ = decoder.feed("{}");
        assert_eq!(decoder.bytes_fed(), 20);
    }

    /// Split `text` at the given char indices (sorted, deduplicated)
    fn partition(text: &str, mut cuts: Vec<usize>) -> Vec<String> {
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut pieces = Vec::new();
        let mut start = 0;
        for cut in cuts {
            let at = boundaries[cut % boundaries.len()];
            if at > start {
                pieces.push(text[start..at].to_string());
                start = at;
            }
        }
        pieces.push(text[start..].to_string());
        pieces
    }

    #[test]
    fn test_every_two_way_split_matches_whole() {
        let input = format!("Day 1: Temple.\nDay 2: Market.\n--{}{}", crate::SENTINEL, PAYLOAD);
        let whole = decode_all(&input);

        for cut in 0..=input.len() {
            let (a, b) = input.split_at(cut);
            let (released, decoded) = run(&[a, b]);
            assert_eq!(decoded.narrative, whole.narrative, "cut at {cut}");
            assert_eq!(decoded.trailer, whole.trailer, "cut at {cut}");
            assert_eq!(released, whole.narrative, "cut at {cut}");
        }
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_output(
            narrative in "[a-zA-Z0-9 \\-_\nวัด]{0,60}",
            trailer in "[a-zA-Z0-9 \\-_{}\":,]{0,60}",
            with_sentinel in any::<bool>(),
            cuts in proptest::collection::vec(0usize..200, 0..12),
        ) {
            let input = if with_sentinel {
                format!("{narrative}{}{trailer}", crate::SENTINEL)
            } else {
                format!("{narrative}{trailer}")
            };
            let whole = decode_all(&input);

            let pieces = partition(&input, cuts);
            let refs: Vec<&str> = pieces.iter().map(String::as_str).collect();
            let (released, decoded) = run(&refs);

            prop_assert_eq!(&decoded.narrative, &whole.narrative);
            prop_assert_eq!(&decoded.trailer, &whole.trailer);
            prop_assert_eq!(&released, &whole.narrative);
        }
    }
}
