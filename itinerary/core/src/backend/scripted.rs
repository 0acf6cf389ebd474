//! Scripted Backend
//!
//! Replays a fixed list of fragments. Used for tests and for replaying
//! recorded responses without a network connection.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::traits::{ItineraryBackend, ItineraryRequest, StreamingToken};

/// How a scripted stream ends
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptedEnd {
    /// Send `Complete` after the last fragment
    Complete,
    /// Send `Error` after the last fragment
    Error(String),
    /// Close the channel without an end signal
    Hangup,
    /// Keep the channel open without sending anything else
    Stall,
}

/// Backend that replays fragments
#[derive(Clone, Debug)]
pub struct ScriptedBackend {
    fragments: Vec<String>,
    end: ScriptedEnd,
    delay: Option<Duration>,
    capacity: usize,
}

impl ScriptedBackend {
    /// Replay `fragments`, then complete
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            end: ScriptedEnd::Complete,
            delay: None,
            capacity: 100,
        }
    }

    /// Change how the stream ends
    #[must_use]
    pub fn with_end(mut self, end: ScriptedEnd) -> Self {
        self.end = end;
        self
    }

    /// Wait this long before each fragment
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Channel capacity
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

#[async_trait]
impl ItineraryBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn send_streaming(
        &self,
        request: &ItineraryRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let fragments = self.fragments.clone();
        let end = self.end.clone();
        let delay = self.delay;

        debug!(
            model = %request.model,
            fragments = fragments.len(),
            "Replaying scripted response"
        );

        tokio::spawn(async move {
            let mut full_response = String::new();

            for fragment in fragments {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                full_response.push_str(&fragment);
                if tx.send(StreamingToken::Token(fragment)).await.is_err() {
                    // Receiver dropped, stop streaming
                    return;
                }
            }

            match end {
                ScriptedEnd::Complete => {
                    let _ = tx
                        .send(StreamingToken::Complete {
                            message: full_response,
                        })
                        .await;
                }
                ScriptedEnd::Error(error) => {
                    let _ = tx.send(StreamingToken::Error(error)).await;
                }
                ScriptedEnd::Hangup => {}
                ScriptedEnd::Stall => tx.closed().await,
            }
        });

        Ok(rx)
    }
}
