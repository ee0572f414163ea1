//! Streaming sessions: the controller, the conversation reducer, and their
//! configuration.
//!
//! # Architecture
//!
//! - [`controller`]: drives runs against the backend — at-most-one run in
//!   flight, retry with backoff, cancellation, consolidation
//! - [`conversation`]: the pure reducer owning message history and session
//!   identity
//! - [`config`]: session configuration and CLI argument parsing
//! - [`commands`]: slash command parsing for the chat binary
//!
//! The split mirrors the data flow: the controller produces values, the
//! caller hands them to the conversation, and the presentation layer reads
//! only from the conversation.

mod commands;
mod config;
mod controller;
mod conversation;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, SessionConfig};
pub use controller::{ControllerStats, RunStream, SessionController};
pub use conversation::{Conversation, Transcript};
