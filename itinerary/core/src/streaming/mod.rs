//! Streaming Infrastructure
//!
//! Connects a provider's fragment channel to a [`StreamSession`](crate::session::StreamSession).
//!
//! ```text
//! ┌────────────┐  StreamingToken   ┌───────────────┐  narrative   ┌────────┐
//! │  Provider  │ ────────────────► │ SessionDriver │ ───────────► │ caller │
//! └────────────┘                   │  ┌─────────┐  │              └────────┘
//!       ▲                          │  │ Session │  │
//!       └────── drop(receiver) ─── │  └─────────┘  │ ──► SessionOutcome
//!                                  └───────────────┘
//! ```
//!
//! # Features
//!
//! - **One fragment in flight**: the driver awaits each fragment before
//!   asking for the next
//! - **Cancellation**: a `CancellationToken` checked before every fragment
//! - **Fragment timeout**: optional caller-side policy that cancels a stalled
//!   stream; the decoder itself has no notion of time

mod driver;

pub use driver::SessionDriver;

// Re-export StreamingToken from backend for convenience
pub use crate::backend::StreamingToken;
