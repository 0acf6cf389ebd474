//! Planner
//!
//! Ties a model provider, the session driver and a trip store together for
//! one user request at a time. Decoding and saving stay separate steps: a
//! completed session is a valid outcome whether or not its trip is saved.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backend::{ItineraryBackend, ItineraryRequest, DEFAULT_MODEL};
use crate::config::ItineraryConfig;
use crate::session::{SessionOutcome, StreamSession};
use crate::store::{NewTrip, StoreError, Trip, TripId, TripStore};
use crate::streaming::SessionDriver;

/// Planner failures outside the session itself
#[derive(Debug, Error)]
pub enum PlanError {
    /// The prompt was empty or whitespace
    #[error("Prompt is required")]
    EmptyPrompt,

    /// The provider could not start a stream
    #[error("Provider failed to start: {0:#}")]
    Backend(anyhow::Error),

    /// The trip store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Request-level facade over a provider and a store
pub struct Planner<B, S> {
    backend: B,
    store: S,
    driver: SessionDriver,
    model: String,
}

impl<B, S> Planner<B, S>
where
    B: ItineraryBackend,
    S: TripStore,
{
    /// Planner with the default model and no fragment timeout
    pub fn new(backend: B, store: S) -> Self {
        Self {
            backend,
            store,
            driver: SessionDriver::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Planner using the model and timeout from `config`
    pub fn from_config(backend: B, store: S, config: &ItineraryConfig) -> Self {
        Self {
            backend,
            store,
            driver: SessionDriver::new().with_fragment_timeout(config.fragment_timeout),
            model: config.model.clone(),
        }
    }

    /// Use a different driver
    #[must_use]
    pub fn with_driver(mut self, driver: SessionDriver) -> Self {
        self.driver = driver;
        self
    }

    /// Model sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The trip store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one planning session
    ///
    /// Narrative segments go to `on_narrative` as they are released. Session
    /// failures (transport, payload) are reported in the returned outcome;
    /// only problems that prevent a session from starting are errors.
    ///
    /// # Errors
    ///
    /// [`PlanError::EmptyPrompt`] for a blank prompt and
    /// [`PlanError::Backend`] when the provider cannot start a stream.
    pub async fn plan<F>(
        &self,
        prompt: &str,
        cancel: CancellationToken,
        on_narrative: F,
    ) -> Result<SessionOutcome, PlanError>
    where
        F: FnMut(&str) + Send,
    {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PlanError::EmptyPrompt);
        }

        let request = ItineraryRequest::new(prompt).with_model(self.model.as_str());
        let receiver = self
            .backend
            .send_streaming(&request)
            .await
            .map_err(PlanError::Backend)?;

        let session = StreamSession::new();
        info!(
            session = %session.id(),
            backend = self.backend.name(),
            model = %self.model,
            "Planning session started"
        );

        Ok(self.driver.run(session, receiver, cancel, on_narrative).await)
    }

    /// Save a completed session as a trip
    ///
    /// Returns `None` for anything but a `Complete` outcome. The narrative
    /// becomes the trip's plan.
    ///
    /// # Errors
    ///
    /// [`PlanError::Store`] if the store rejects the trip.
    pub async fn save(&self, outcome: &SessionOutcome) -> Result<Option<TripId>, PlanError> {
        let SessionOutcome::Complete {
            narrative,
            itinerary,
        } = outcome
        else {
            return Ok(None);
        };

        let trip = NewTrip::new(itinerary.payload.clone(), narrative.as_str());
        match self.store.save(trip).await {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                warn!(error = %e, "Failed to save trip");
                Err(e.into())
            }
        }
    }

    /// Saved trips, newest first
    ///
    /// # Errors
    ///
    /// [`PlanError::Store`] if the store cannot be read.
    pub async fn history(&self) -> Result<Vec<Trip>, PlanError> {
        Ok(self.store.list().await?)
    }

    /// Delete a saved trip; `false` if it did not exist
    ///
    /// # Errors
    ///
    /// [`PlanError::Store`] if the store cannot be updated.
    pub async fn delete(&self, id: &TripId) -> Result<bool, PlanError> {
        Ok(self.store.delete_by_id(id).await?)
    }
}
