//! Configuration for streaming sessions.
//!
//! This module provides CLI argument parsing via `arrrg` for the chat binary
//! and the [`SessionConfig`] structure controlling retry, history, and undo
//! behavior. Configuration is always passed in explicitly; the library never
//! reads ambient globals.

use std::time::Duration;

use arrrg_derive::CommandLine;

/// Default maximum number of retries per submission.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between retries; grows with the attempt count.
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default ceiling for the retry delay.
const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(8);

/// Default number of history messages sent with each run.
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Default grace window for undoing a conversation clear.
const DEFAULT_UNDO_GRACE: Duration = Duration::from_secs(10);

/// Command-line arguments for the inventio-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend base URL (default: http://localhost:8000)", "URL")]
    pub backend: Option<String>,

    /// API key for the backend.
    #[arrrg(optional, "API key sent as x-api-key", "KEY")]
    pub api_key: Option<String>,

    /// Maximum retries per submission.
    #[arrrg(optional, "Max retries per submission (default: 3)", "N")]
    pub max_retries: Option<u32>,

    /// History messages sent with each run.
    #[arrrg(optional, "History messages sent per run (default: 20)", "N")]
    pub history_limit: Option<u32>,

    /// Path to a document file used as document context.
    #[arrrg(optional, "Document file to send as context", "PATH")]
    pub document: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a streaming session controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of retries for one submission. Zero disables retries.
    pub max_retries: u32,

    /// Base delay before the first retry; later retries wait proportionally
    /// longer.
    pub retry_base_delay: Duration,

    /// Ceiling on the retry delay.
    pub retry_max_delay: Duration,

    /// How many recent messages to send as conversation history.
    /// `None` sends the full history.
    pub history_limit: Option<usize>,

    /// How long a cleared conversation stays undoable.
    pub undo_grace: Duration,
}

impl SessionConfig {
    /// Creates a configuration with default values.
    ///
    /// Defaults:
    /// - Max retries: 3
    /// - Retry delay: 500ms base, growing per attempt, capped at 8s
    /// - History limit: 20 messages
    /// - Undo grace window: 10s
    pub fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            retry_max_delay: DEFAULT_RETRY_MAX_DELAY,
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
            undo_grace: DEFAULT_UNDO_GRACE,
        }
    }

    /// Sets the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the retry delay parameters.
    pub fn with_retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max;
        self
    }

    /// Sets the history limit. `None` sends the full history.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    /// Sets the undo grace window.
    pub fn with_undo_grace(mut self, grace: Duration) -> Self {
        self.undo_grace = grace;
        self
    }

    /// The delay before retry number `attempt` (1-based), growing
    /// proportionally with the attempt count and capped at the maximum.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(attempt.max(1))
            .min(self.retry_max_delay)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&ChatArgs> for SessionConfig {
    fn from(args: &ChatArgs) -> Self {
        SessionConfig {
            max_retries: args.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            history_limit: args
                .history_limit
                .map(|n| n as usize)
                .or(Some(DEFAULT_HISTORY_LIMIT)),
            ..SessionConfig::new()
        }
    }
}
