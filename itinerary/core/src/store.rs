//! Trip Store
//!
//! Persistence is an external collaborator. This module defines the shape it
//! receives (a validated payload plus the narrative) and the three operations
//! the planner needs. [`InMemoryTripStore`] backs tests and single-process use.
//!
//! Saving is not coupled to decoding: a session can complete and its trip can
//! still fail to save.

use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::payload::{ItineraryPayload, Location};

/// Unique identifier for a saved trip
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripId(pub Uuid);

impl TripId {
    /// Generate a new trip ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TripId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TripId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A trip ready to be saved
///
/// Serialize-only: the flattened payload carries `f64` coordinates, which
/// cannot be read back through `flatten` with arbitrary-precision numbers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewTrip {
    /// Validated payload
    #[serde(flatten)]
    pub payload: ItineraryPayload,
    /// The narrative plan shown to the user
    pub plan: String,
}

impl NewTrip {
    /// Pair a payload with its narrative
    pub fn new(payload: ItineraryPayload, plan: impl Into<String>) -> Self {
        Self {
            payload,
            plan: plan.into(),
        }
    }
}

/// A saved trip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Store-assigned ID
    pub id: TripId,
    /// Trip title
    pub title: String,
    /// Main destination
    pub destination: String,
    /// Human-readable duration
    pub duration: String,
    /// Narrative plan
    pub plan: String,
    /// Waypoints
    pub locations: Vec<Location>,
    /// When the trip was saved
    pub created_at: DateTime<Utc>,
}

impl Trip {
    fn from_new(id: TripId, trip: NewTrip, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: trip.payload.title,
            destination: trip.payload.destination,
            duration: trip.payload.duration,
            plan: trip.plan,
            locations: trip.payload.locations,
            created_at,
        }
    }
}

/// Store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the trip
    #[error("Trip rejected: {0}")]
    Rejected(String),
}

/// Persistence collaborator
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Save a trip, returning its new ID
    async fn save(&self, trip: NewTrip) -> Result<TripId, StoreError>;

    /// All trips, newest first
    async fn list(&self) -> Result<Vec<Trip>, StoreError>;

    /// Delete a trip; `false` if it did not exist
    async fn delete_by_id(&self, id: &TripId) -> Result<bool, StoreError>;
}

/// Process-local trip store
///
/// Keeps trips newest-first. With a `max_trips` limit the oldest trips are
/// evicted on save.
#[derive(Debug, Default)]
pub struct InMemoryTripStore {
    trips: RwLock<VecDeque<Trip>>,
    /// 0 = unlimited
    max_trips: usize,
}

impl InMemoryTripStore {
    /// Unlimited store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that keeps at most `max_trips` (0 = unlimited)
    #[must_use]
    pub fn with_limit(max_trips: usize) -> Self {
        Self {
            trips: RwLock::new(VecDeque::new()),
            max_trips,
        }
    }

    /// Number of stored trips
    #[must_use]
    pub fn len(&self) -> usize {
        self.trips.read().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trips.read().is_empty()
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn save(&self, trip: NewTrip) -> Result<TripId, StoreError> {
        let id = TripId::new();
        let trip = Trip::from_new(id, trip, Utc::now());

        let mut trips = self.trips.write();
        trips.push_front(trip);
        if self.max_trips > 0 {
            while trips.len() > self.max_trips {
                if let Some(evicted) = trips.pop_back() {
                    debug!(trip = %evicted.id, "Evicted oldest trip");
                }
            }
        }

        info!(trip = %id, total = trips.len(), "Trip saved");
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<Trip>, StoreError> {
        Ok(self.trips.read().iter().cloned().collect())
    }

    async fn delete_by_id(&self, id: &TripId) -> Result<bool, StoreError> {
        let mut trips = self.trips.write();
        let Some(pos) = trips.iter().position(|t| t.id == *id) else {
            return Ok(false);
        };
        trips.remove(pos);
        info!(trip = %id, "Trip deleted");
        Ok(true)
    }
}
