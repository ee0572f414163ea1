//! Slash command parsing for the chat binary.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the session without submitting a run.

/// A parsed chat command.
///
/// These commands control the session and are never sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history and session id.
    Clear,

    /// Undo the last clear, inside the grace window.
    Undo,

    /// Show the current session id.
    Session,

    /// Show the last N messages (all when `None`).
    History(Option<usize>),

    /// Toggle the thoughts panel for the streaming run.
    Thoughts(bool),

    /// Check backend health.
    Health,

    /// Display controller statistics.
    Stats,

    /// Save the transcript to a file.
    Save(String),

    /// Load a transcript from a file.
    Load(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be submitted as a regular message.
///
/// # Examples
///
/// ```
/// # use inventio::session::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/history 5").is_some());
/// assert!(parse_command("Draft claims for a 5G handover scheme").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "undo" => ChatCommand::Undo,
        "session" => ChatCommand::Session,
        "history" => match argument {
            Some(n) => match n.parse::<usize>() {
                Ok(n) => ChatCommand::History(Some(n)),
                Err(_) => ChatCommand::Invalid("/history takes a number".to_string()),
            },
            None => ChatCommand::History(None),
        },
        "thoughts" => match argument {
            Some("on") | Some("show") => ChatCommand::Thoughts(true),
            Some("off") | Some("hide") => ChatCommand::Thoughts(false),
            _ => ChatCommand::Invalid("/thoughts requires on or off".to_string()),
        },
        "health" => ChatCommand::Health,
        "stats" => ChatCommand::Stats,
        "save" => match argument {
            Some(path) => ChatCommand::Save(path.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "load" => match argument {
            Some(path) => ChatCommand::Load(path.to_string()),
            None => ChatCommand::Invalid("/load requires a file path".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns the help text describing all commands.
pub fn help_text() -> &'static str {
    "Available commands:
/clear            Clear the conversation (undoable for a few seconds)
/undo             Undo the last /clear
/session          Show the current session id
/history [n]      Show the last n messages (default: all)
/thoughts on|off  Expand or collapse thoughts for the streaming response
/health           Check backend health
/stats            Show controller statistics
/save <path>      Save the transcript to a file
/load <path>      Load a transcript from a file
/help             Show this help
/quit             Exit"
}
