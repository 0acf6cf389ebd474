//! Session Driver
//!
//! Pulls fragments from a provider channel into a [`StreamSession`], one at a
//! time, and forwards released narrative to the caller.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::StreamingToken;
use crate::session::{SessionOutcome, StreamEnd, StreamSession, TransportError};

/// What woke the driver
enum Wake {
    Token(Option<StreamingToken>),
    Cancelled,
    TimedOut,
}

/// Drives a session from a fragment channel
#[derive(Clone, Debug, Default)]
pub struct SessionDriver {
    /// Cancel if no fragment arrives within this long
    fragment_timeout: Option<Duration>,
}

impl SessionDriver {
    /// Driver without a fragment timeout
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or clear) the fragment timeout
    #[must_use]
    pub fn with_fragment_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fragment_timeout = timeout;
        self
    }

    /// Configured fragment timeout
    #[must_use]
    pub fn fragment_timeout(&self) -> Option<Duration> {
        self.fragment_timeout
    }

    /// Run `session` to a terminal outcome
    ///
    /// `on_narrative` receives each released narrative segment in order,
    /// including the tail flushed at end of stream. Cancellation (via `cancel`
    /// or the fragment timeout) is checked before every fragment. The
    /// receiver is dropped before returning, which stops the provider.
    pub async fn run<F>(
        &self,
        mut session: StreamSession,
        mut receiver: mpsc::Receiver<StreamingToken>,
        cancel: CancellationToken,
        mut on_narrative: F,
    ) -> SessionOutcome
    where
        F: FnMut(&str) + Send,
    {
        debug!(session = %session.id(), timeout = ?self.fragment_timeout, "Driving session");

        let end: Option<StreamEnd> = loop {
            let wake = tokio::select! {
                biased;
                () = cancel.cancelled() => Wake::Cancelled,
                next = next_token(&mut receiver, self.fragment_timeout) => {
                    next.map_or(Wake::TimedOut, Wake::Token)
                }
            };

            match wake {
                Wake::Token(Some(StreamingToken::Token(fragment))) => {
                    if let Some(segment) = session.fragment_arrived(&fragment) {
                        on_narrative(&segment);
                    }
                }
                Wake::Token(Some(StreamingToken::Complete { .. })) => break Some(Ok(())),
                Wake::Token(Some(StreamingToken::Error(error))) => {
                    break Some(Err(TransportError::Upstream(error)));
                }
                Wake::Token(None) => break Some(Err(TransportError::Closed)),
                Wake::Cancelled => break None,
                Wake::TimedOut => {
                    warn!(
                        session = %session.id(),
                        timeout = ?self.fragment_timeout,
                        "No fragment within timeout, cancelling"
                    );
                    break None;
                }
            }
        };

        // Release the upstream handle before validation
        drop(receiver);

        match end {
            Some(end) => {
                let (tail, _) = session.stream_ended(end);
                if let Some(tail) = tail {
                    on_narrative(&tail);
                }
            }
            None => session.cancel(),
        }

        session.into_outcome().unwrap_or(SessionOutcome::Cancelled)
    }
}

/// Await the next token, giving up after `timeout`
///
/// `None` means the timeout expired.
async fn next_token(
    receiver: &mut mpsc::Receiver<StreamingToken>,
    timeout: Option<Duration>,
) -> Option<Option<StreamingToken>> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, receiver.recv()).await.ok(),
        None => Some(receiver.recv().await),
    }
}
