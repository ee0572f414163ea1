//! Client library for a patent drafting agent backend.
//!
//! A submission flows through four layers, leaves first:
//!
//! 1. [`sse`] decodes the backend's `text/event-stream` bytes into records.
//! 2. [`classify`] maps each record onto one observable effect.
//! 3. [`session::SessionController`] drives a run to one consolidated
//!    result — at most one run in flight, retry with backoff, explicit
//!    cancellation.
//! 4. [`session::Conversation`] owns the durable message history and session
//!    identity.
//!
//! Document manipulation is reached only through the [`document`] seam.

// Public modules
pub mod classify;
pub mod client;
pub mod document;
pub mod error;
pub mod observability;
pub mod run;
pub mod run_logger;
pub mod session;
pub mod sse;
pub mod types;
pub mod utils;

// Re-exports
pub use classify::{Projection, classify};
pub use client::{Backend, BackendConfig};
pub use document::DocumentAccess;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use run::{ChunkKind, CompletedRun, ProgressChunk, RunFailure, RunUpdate};
pub use run_logger::RunLogger;
pub use session::{Conversation, RunStream, SessionConfig, SessionController, Transcript};
pub use sse::RawEvent;
pub use types::*;
