//! Stream Session
//!
//! One session per user request. It owns the decoder for that request and
//! turns three external events into a terminal outcome:
//!
//! ```text
//!   Init ──fragment──► Streaming ──sentinel──► SentinelFound
//!                          │                        │
//!                      stream end               stream end
//!                          ▼                        ▼
//!                 CompleteNoPayload        Complete | Failed
//!
//!   any non-terminal state ──transport error──► Failed
//!   any non-terminal state ──cancel──────────► Cancelled
//! ```
//!
//! The session never blocks and never spawns work; the caller drives it one
//! fragment at a time (see [`crate::streaming::SessionDriver`]).
//!
//! On cancellation the session drops its copy of the narrative. Segments
//! already handed to the caller stay with the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::decoder::StreamDecoder;
use crate::payload::{validate, PayloadError, ValidatedItinerary};
use crate::sanitize::sanitize;

/// Unique identifier for a stream session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Created, nothing consumed yet
    Init,
    /// Fragments arriving, sentinel not seen
    Streaming,
    /// Sentinel seen, fragments go to the trailer
    SentinelFound,
    /// Stream ended with an accepted payload
    Complete,
    /// Stream ended without a sentinel; the narrative is the whole result
    CompleteNoPayload,
    /// Transport failure or rejected payload
    Failed,
    /// Aborted by the caller
    Cancelled,
}

impl SessionState {
    /// Whether no further events will be processed
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Complete | Self::CompleteNoPayload | Self::Failed | Self::Cancelled
        )
    }
}

/// Failure of the upstream fragment source
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The provider reported an error mid-stream
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The fragment channel closed without an end-of-stream signal
    #[error("Stream closed before completion")]
    Closed,
}

/// Why a session failed
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SessionError {
    /// Fatal to the session
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Fatal to the payload only; the narrative is intact
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// How the upstream stream ended
pub type StreamEnd = Result<(), TransportError>;

/// Terminal result of a session
#[derive(Clone, Debug, PartialEq)]
pub enum SessionOutcome {
    /// Sentinel found and payload accepted (possibly with dropped locations)
    Complete {
        /// Full narrative
        narrative: String,
        /// Accepted payload and drop report
        itinerary: ValidatedItinerary,
    },
    /// No sentinel; the narrative is the whole answer
    NarrativeOnly {
        /// Full narrative
        narrative: String,
    },
    /// Transport failure or rejected payload
    Failed {
        /// Narrative produced before the failure
        narrative: String,
        /// What went wrong
        error: SessionError,
    },
    /// Aborted by the caller
    Cancelled,
}

impl SessionOutcome {
    /// State this outcome corresponds to
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self {
            Self::Complete { .. } => SessionState::Complete,
            Self::NarrativeOnly { .. } => SessionState::CompleteNoPayload,
            Self::Failed { .. } => SessionState::Failed,
            Self::Cancelled => SessionState::Cancelled,
        }
    }

    /// Narrative to show the user (empty when cancelled)
    #[must_use]
    pub fn narrative(&self) -> &str {
        match self {
            Self::Complete { narrative, .. }
            | Self::NarrativeOnly { narrative }
            | Self::Failed { narrative, .. } => narrative,
            Self::Cancelled => "",
        }
    }

    /// Accepted payload, if any
    #[must_use]
    pub fn itinerary(&self) -> Option<&ValidatedItinerary> {
        match self {
            Self::Complete { itinerary, .. } => Some(itinerary),
            _ => None,
        }
    }

    /// Failure, if any
    #[must_use]
    pub fn error(&self) -> Option<&SessionError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Per-request decoding state machine
#[derive(Debug)]
pub struct StreamSession {
    id: SessionId,
    state: SessionState,
    /// Present until the stream ends or is cancelled
    decoder: Option<StreamDecoder>,
    outcome: Option<SessionOutcome>,
    fragments: u64,
}

impl StreamSession {
    /// Create a session in `Init`
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            state: SessionState::Init,
            decoder: Some(StreamDecoder::new()),
            outcome: None,
            fragments: 0,
        }
    }

    /// Session ID
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Fragments consumed so far
    #[must_use]
    pub fn fragment_count(&self) -> u64 {
        self.fragments
    }

    /// Narrative released so far (final narrative once terminal)
    #[must_use]
    pub fn narrative(&self) -> &str {
        match (&self.decoder, &self.outcome) {
            (Some(decoder), _) => decoder.narrative(),
            (None, Some(outcome)) => outcome.narrative(),
            (None, None) => "",
        }
    }

    /// Terminal outcome, once reached
    #[must_use]
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Consume the session, returning its outcome if terminal
    #[must_use]
    pub fn into_outcome(self) -> Option<SessionOutcome> {
        self.outcome
    }

    /// Handle `fragmentArrived`
    ///
    /// Returns newly displayable narrative. Ignored once terminal.
    pub fn fragment_arrived(&mut self, fragment: &str) -> Option<String> {
        let Some(decoder) = self.decoder.as_mut() else {
            debug!(session = %self.id, state = ?self.state, "Ignoring fragment after terminal state");
            return None;
        };

        self.fragments += 1;
        let segment = decoder.feed(fragment);

        let next = if decoder.sentinel_found() {
            SessionState::SentinelFound
        } else {
            SessionState::Streaming
        };
        if next != self.state {
            debug!(session = %self.id, from = ?self.state, to = ?next, "Session state changed");
            self.state = next;
        }

        segment
    }

    /// Handle `streamEnded`
    ///
    /// Returns the narrative flushed at end of stream together with the
    /// outcome. Repeated calls return the existing outcome and no segment.
    pub fn stream_ended(&mut self, end: StreamEnd) -> (Option<String>, &SessionOutcome) {
        let Some(decoder) = self.decoder.take() else {
            let outcome = self.outcome.get_or_insert(SessionOutcome::Cancelled);
            return (None, outcome);
        };

        let decoded = decoder.finish();
        let outcome = match (end, decoded.trailer) {
            (Err(error), _) => {
                warn!(session = %self.id, %error, "Stream failed");
                SessionOutcome::Failed {
                    narrative: decoded.narrative,
                    error: error.into(),
                }
            }
            (Ok(()), None) => SessionOutcome::NarrativeOnly {
                narrative: decoded.narrative,
            },
            (Ok(()), Some(trailer)) => match validate(sanitize(&trailer)) {
                Ok(itinerary) => SessionOutcome::Complete {
                    narrative: decoded.narrative,
                    itinerary,
                },
                Err(error) => SessionOutcome::Failed {
                    narrative: decoded.narrative,
                    error: error.into(),
                },
            },
        };

        self.state = outcome.state();
        info!(
            session = %self.id,
            state = ?self.state,
            fragments = self.fragments,
            narrative_bytes = outcome.narrative().len(),
            locations = outcome.itinerary().map(|i| i.payload.locations.len()),
            "Session finished"
        );

        (decoded.final_segment, self.outcome.insert(outcome))
    }

    /// Handle `cancel`
    ///
    /// Discards the decoder and any narrative it holds. No effect once
    /// terminal.
    pub fn cancel(&mut self) {
        if self.decoder.take().is_none() {
            return;
        }
        info!(session = %self.id, fragments = self.fragments, "Session cancelled");
        self.state = SessionState::Cancelled;
        self.outcome = Some(SessionOutcome::Cancelled);
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{ItineraryPayload, Location, LocationValidationWarning};
    use pretty_assertions::assert_eq;

    const PAYLOAD: &str = r#"{"title":"T","destination":"D","duration":"2 days","locations":[{"name":"Wat","lat":18.7,"lng":99.0}]}"#;

    fn drive(fragments: &[&str], end: StreamEnd) -> (String, StreamSession) {
        let mut session = StreamSession::new();
        let mut shown = String::new();
        for fragment in fragments {
            if let Some(segment) = session.fragment_arrived(fragment) {
                shown.push_str(&segment);
            }
        }
        if let (Some(tail), _) = session.stream_ended(end) {
            shown.push_str(&tail);
        }
        (shown, session)
    }

    #[test]
    fn test_state_progression() {
        let mut session = StreamSession::new();
        assert_eq!(session.state(), SessionState::Init);

        session.fragment_arrived("Day 1\n");
        assert_eq!(session.state(), SessionState::Streaming);

        session.fragment_arrived("---JSON_DATA---");
        assert_eq!(session.state(), SessionState::SentinelFound);

        session.fragment_arrived(PAYLOAD);
        assert_eq!(session.state(), SessionState::SentinelFound);

        let (_, outcome) = session.stream_ended(Ok(()));
        assert_eq!(outcome.state(), SessionState::Complete);
        assert_eq!(session.state(), SessionState::Complete);
        assert!(session.state().is_terminal());
    }

    #[test]
    fn test_example_scenario() {
        let (shown, session) = drive(
            &["Day 1: Temple.\n", "Day 2: Market.\n---JSO", "N_DATA---", PAYLOAD],
            Ok(()),
        );

        assert_eq!(shown, "Day 1: Temple.\nDay 2: Market.\n");
        assert_eq!(session.state(), SessionState::Complete);
        let outcome = session.into_outcome().unwrap();
        assert_eq!(outcome.narrative(), "Day 1: Temple.\nDay 2: Market.\n");
        assert_eq!(
            outcome.itinerary().unwrap().payload,
            ItineraryPayload {
                title: "T".to_string(),
                destination: "D".to_string(),
                duration: "2 days".to_string(),
                locations: vec![Location::new("Wat", 18.7, 99.0)],
            }
        );
    }

    #[test]
    fn test_fenced_trailer_is_accepted() {
        let fenced = format!("\n```json\n{PAYLOAD}\n```\n");
        let (_, session) = drive(&["Plan\n---JSON_DATA---", fenced.as_str()], Ok(()));
        assert_eq!(session.state(), SessionState::Complete);
    }

    #[test]
    fn test_no_sentinel_is_narrative_only() {
        let (shown, session) = drive(&["Just a ", "plan --", "-"], Ok(()));
        assert_eq!(shown, "Just a plan ---");
        assert_eq!(session.state(), SessionState::CompleteNoPayload);
        assert_eq!(
            session.outcome(),
            Some(&SessionOutcome::NarrativeOnly {
                narrative: "Just a plan ---".to_string()
            })
        );
    }

    #[test]
    fn test_end_without_fragments() {
        let (shown, session) = drive(&[], Ok(()));
        assert_eq!(shown, "");
        assert_eq!(session.state(), SessionState::CompleteNoPayload);
    }

    #[test]
    fn test_malformed_trailer_fails_but_keeps_narrative() {
        let (_, session) = drive(&["Plan text\n---JSON_DATA---", "{title: 'T'"], Ok(()));

        assert_eq!(session.state(), SessionState::Failed);
        let outcome = session.outcome().unwrap();
        assert_eq!(outcome.narrative(), "Plan text\n");
        match outcome.error() {
            Some(SessionError::Payload(err)) => assert_eq!(err.raw(), Some("{title: 'T'")),
            other => panic!("expected payload error, got {other:?}"),
        }
    }

    #[test]
    fn test_schema_violation_fails() {
        let (_, session) = drive(&["Plan---JSON_DATA---{\"title\":\"T\"}"], Ok(()));
        assert!(matches!(
            session.outcome().unwrap().error(),
            Some(SessionError::Payload(PayloadError::SchemaViolation { .. }))
        ));
        assert_eq!(session.narrative(), "Plan");
    }

    #[test]
    fn test_dropped_locations_still_complete() {
        let trailer = r#"{"title":"T","destination":"D","duration":"1 day","locations":[
            {"name":"A","lat":1,"lng":1},{"name":"B","lat":200,"lng":1},{"name":"C","lat":2,"lng":2}]}"#;
        let (_, session) = drive(&["Plan---JSON_DATA---", trailer], Ok(()));

        assert_eq!(session.state(), SessionState::Complete);
        let itinerary = session.outcome().unwrap().itinerary().unwrap();
        assert_eq!(itinerary.payload.locations.len(), 2);
        assert_eq!(itinerary.warning(), Some(LocationValidationWarning { dropped: 1 }));
    }

    #[test]
    fn test_transport_error_keeps_partial_narrative() {
        let (shown, session) = drive(
            &["Day 1: Temple.\n", "Day 2: Mar"],
            Err(TransportError::Upstream("connection reset".to_string())),
        );

        assert_eq!(shown, "Day 1: Temple.\nDay 2: Mar");
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(
            session.outcome().unwrap().error(),
            Some(&SessionError::Transport(TransportError::Upstream(
                "connection reset".to_string()
            )))
        );
        assert_eq!(session.narrative(), "Day 1: Temple.\nDay 2: Mar");
    }

    #[test]
    fn test_transport_error_after_sentinel_skips_validation() {
        let (_, session) = drive(&["Plan---JSON_DATA---", PAYLOAD], Err(TransportError::Closed));
        assert_eq!(
            session.outcome().unwrap().error(),
            Some(&SessionError::Transport(TransportError::Closed))
        );
    }

    #[test]
    fn test_cancel_discards_narrative_and_ignores_input() {
        let mut session = StreamSession::new();
        session.fragment_arrived("Day 1: Temple.\n");
        session.cancel();

        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(session.narrative(), "");
        assert_eq!(session.fragment_arrived("more"), None);
        assert_eq!(session.fragment_count(), 1);

        let (tail, outcome) = session.stream_ended(Ok(()));
        assert_eq!(tail, None);
        assert_eq!(outcome, &SessionOutcome::Cancelled);
    }

    #[test]
    fn test_cancel_after_completion_is_noop() {
        let (_, mut session) = drive(&["Plan"], Ok(()));
        session.cancel();
        assert_eq!(session.state(), SessionState::CompleteNoPayload);
        assert_eq!(session.narrative(), "Plan");
    }

    #[test]
    fn test_repeated_stream_end_returns_same_outcome() {
        let (_, mut session) = drive(&["Plan"], Ok(()));
        let (tail, outcome) = session.stream_ended(Err(TransportError::Closed));
        assert_eq!(tail, None);
        assert_eq!(outcome.state(), SessionState::CompleteNoPayload);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(StreamSession::new().id(), StreamSession::new().id());
    }
}
