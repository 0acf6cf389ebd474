//! Model Provider Integration
//!
//! The remote model is reached through the [`ItineraryBackend`] trait, which
//! yields a channel of fragments ending in an explicit completion signal.
//!
//! # Available Backends
//!
//! - **Scripted**: replays a fixed fragment list (tests, recorded responses)
//! - **Reader**: streams any async byte reader (files, stdin, pipes)
//!
//! # Usage
//!
//! ```ignore
//! use itinerary_core::backend::{ItineraryBackend, ItineraryRequest, ScriptedBackend};
//!
//! let backend = ScriptedBackend::new(["Day 1...", "---JSON_DATA---", "{...}"]);
//! let rx = backend.send_streaming(&ItineraryRequest::new("3 days in Chiang Mai")).await?;
//! ```

mod prompt;
mod reader;
mod scripted;
mod traits;

pub use prompt::SYSTEM_PROMPT;
pub use reader::{ReaderBackend, DEFAULT_CHUNK_SIZE};
pub use scripted::{ScriptedBackend, ScriptedEnd};
pub use traits::{ItineraryBackend, ItineraryRequest, StreamingToken, DEFAULT_MODEL};
