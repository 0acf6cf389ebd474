//! Itinerary Core - Dual-Channel Stream Decoding for the Trip Planner
//!
//! A single streamed model response carries two things: a Markdown narrative
//! shown to the user as it arrives, and a JSON itinerary (title, destination,
//! duration, waypoints) after a fixed sentinel line. This crate splits the
//! stream, releases narrative as soon as it is known not to be part of the
//! sentinel, and validates the trailer into waypoints a map can plot.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Model Provider                           │
//! │        ItineraryBackend ──► mpsc::Receiver<StreamingToken>       │
//! └────────────────────────────────┬─────────────────────────────────┘
//!                                  │ fragments, then Complete | Error
//! ┌────────────────────────────────┼─────────────────────────────────┐
//! │                         ITINERARY CORE                           │
//! │  ┌─────────────────────────────┴──────────────────────────────┐  │
//! │  │ SessionDriver (async, cancel + fragment timeout)            │  │
//! │  │  ┌──────────────────────────────────────────────────────┐  │  │
//! │  │  │ StreamSession (sync state machine)                    │  │  │
//! │  │  │  ┌───────────────┐  ┌──────────┐  ┌───────────────┐  │  │  │
//! │  │  │  │ StreamDecoder │─►│ sanitize │─►│   validate    │  │  │  │
//! │  │  │  │ (KMP sentinel)│  │ (fences) │  │ (payload+geo) │  │  │  │
//! │  │  │  └───────────────┘  └──────────┘  └───────────────┘  │  │  │
//! │  │  └──────────────────────────────────────────────────────┘  │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! │  Planner ──► TripStore (save / list / delete)                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use itinerary_core::{InMemoryTripStore, Planner, ScriptedBackend};
//! use tokio_util::sync::CancellationToken;
//!
//! let backend = ScriptedBackend::new(["Day 1...", "---JSON_DATA---", "{...}"]);
//! let planner = Planner::new(backend, InMemoryTripStore::new());
//!
//! let outcome = planner
//!     .plan("3 days in Chiang Mai", CancellationToken::new(), |text| print!("{text}"))
//!     .await?;
//! planner.save(&outcome).await?;
//! ```
//!
//! # Module Overview
//!
//! - [`sentinel`]: Incremental KMP matcher for the sentinel literal
//! - [`decoder`]: Fragment-by-fragment narrative/trailer split
//! - [`sanitize`]: Markdown fence stripping for the trailer
//! - [`payload`]: Itinerary payload validation and coordinate checks
//! - [`category`]: Closed set of waypoint categories
//! - [`session`]: Per-request state machine and outcomes
//! - [`streaming`]: Async driver feeding a session from a provider channel
//! - [`backend`]: Model provider abstraction
//! - [`store`]: Trip persistence abstraction
//! - [`planner`]: Request-level facade
//! - [`config`]: TOML, environment and CLI configuration
//!
//! The decoding modules (`sentinel`, `decoder`, `sanitize`, `payload`,
//! `category`, `session`) are synchronous and never block or spawn work.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod category;
pub mod config;
pub mod decoder;
pub mod payload;
pub mod planner;
pub mod sanitize;
pub mod sentinel;
pub mod session;
pub mod store;
pub mod streaming;

// Re-exports for convenience
pub use backend::{
    ItineraryBackend, ItineraryRequest, ReaderBackend, ScriptedBackend, ScriptedEnd,
    StreamingToken, SYSTEM_PROMPT,
};
pub use category::LocationCategory;
pub use decoder::{decode_all, DecodedStream, StreamDecoder};
pub use payload::{
    validate, validate_value, DroppedLocation, ItineraryPayload, Location,
    LocationValidationWarning, PayloadError, RejectionReason, ValidatedItinerary,
};
pub use planner::{PlanError, Planner};
pub use sanitize::sanitize;
pub use sentinel::{SentinelMatcher, SENTINEL};
pub use session::{
    SessionError, SessionId, SessionOutcome, SessionState, StreamEnd, StreamSession,
    TransportError,
};
pub use store::{InMemoryTripStore, NewTrip, StoreError, Trip, TripId, TripStore};
pub use streaming::SessionDriver;

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, ItineraryConfig, ItineraryToml,
};
