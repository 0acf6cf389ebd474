//! Model Provider Traits
//!
//! The remote model is an external collaborator. The session only depends on
//! the order of fragments and an explicit end-of-stream signal, so providers
//! expose exactly that: a channel of [`StreamingToken`]s.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::prompt::SYSTEM_PROMPT;

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Token stream events from model providers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamingToken {
    /// A fragment of the response
    Token(String),
    /// Response completed successfully
    Complete {
        /// The complete message as seen by the provider
        message: String,
    },
    /// Error occurred during streaming
    Error(String),
}

/// A request for a trip plan
#[derive(Clone, Debug)]
pub struct ItineraryRequest {
    /// The user's free-text trip description
    pub prompt: String,
    /// Model to use (provider-specific identifier)
    pub model: String,
    /// System instruction sent ahead of the prompt
    pub system: String,
}

impl ItineraryRequest {
    /// Create a request using the standard travel-planner instruction
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_MODEL.to_string(),
            system: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the system instruction
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }
}

/// Model provider trait
///
/// Implementations send [`StreamingToken::Token`] for each fragment in order,
/// then exactly one [`StreamingToken::Complete`] or [`StreamingToken::Error`].
/// Dropping the receiver must stop the provider.
#[async_trait]
pub trait ItineraryBackend: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Start a streamed response
    async fn send_streaming(
        &self,
        request: &ItineraryRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>>;
}
