//! Interactive chat with the patent drafting assistant.
//!
//! This binary provides a streaming REPL on top of the inventio client
//! library: thoughts render as they arrive, Ctrl+C cancels the active run,
//! and slash commands control the conversation.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local backend
//! inventio-chat
//!
//! # Point at a deployed backend with a key
//! inventio-chat --backend https://agents.example.com --api-key $KEY
//!
//! # Send a document as context
//! inventio-chat --document disclosure.txt
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear the conversation (undoable for a few seconds)
//! - `/undo` - Undo the last clear
//! - `/thoughts on|off` - Expand or collapse streaming thoughts
//! - `/quit` - Exit the application

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use inventio::session::{ChatArgs, ChatCommand, help_text, parse_command};
use inventio::{
    Backend, BackendConfig, ChatMessage, ChunkKind, Conversation, DocumentContent, RunUpdate,
    SessionConfig, SessionController, Transcript,
};

/// ANSI escape code for dim text (used for thoughts).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Main entry point for the inventio-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("inventio-chat [OPTIONS]");
    let use_color = !args.no_color;

    let mut backend_config = BackendConfig::new();
    if let Some(backend) = &args.backend {
        backend_config = backend_config.with_base_url(backend.clone());
    }
    if let Some(api_key) = &args.api_key {
        backend_config = backend_config.with_api_key(api_key.clone());
    }
    let backend = Backend::new(backend_config)?;
    let controller = SessionController::new(backend.clone(), SessionConfig::from(&args));
    let mut conversation = Conversation::new();

    let document = match &args.document {
        Some(path) => DocumentContent::from_text(fs::read_to_string(path)?),
        None => DocumentContent::default(),
    };

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut rl = DefaultEditor::new()?;

    println!("Patent drafting assistant ({})", backend.base_url());
    println!("Type /help for commands, /quit to exit\n");

    loop {
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            conversation.clear();
                            print_info("Conversation cleared. /undo to restore.", use_color);
                        }
                        ChatCommand::Undo => {
                            if conversation.undo() {
                                print_info("Conversation restored.", use_color);
                            } else {
                                print_info("Nothing to undo.", use_color);
                            }
                        }
                        ChatCommand::Session => match conversation.session_id() {
                            Some(id) => println!("    Session: {id}"),
                            None => println!("    Session: (not assigned yet)"),
                        },
                        ChatCommand::History(limit) => {
                            for message in conversation.history(limit) {
                                println!("    [{}] {}", message.role, message.content);
                            }
                        }
                        ChatCommand::Thoughts(expanded) => {
                            controller.set_thoughts_expanded(expanded);
                            print_info(
                                if expanded {
                                    "Thoughts expanded."
                                } else {
                                    "Thoughts collapsed."
                                },
                                use_color,
                            );
                        }
                        ChatCommand::Health => match backend.health_check().await {
                            Ok(true) => print_info("Backend is healthy.", use_color),
                            Ok(false) => print_error("Backend is unhealthy.", use_color),
                            Err(err) => print_error(&err.to_string(), use_color),
                        },
                        ChatCommand::Stats => {
                            let stats = controller.stats();
                            println!("    Messages: {}", conversation.message_count());
                            println!("    Runs completed: {}", stats.runs_completed);
                            println!("    Runs failed: {}", stats.runs_failed);
                            println!("    Runs cancelled: {}", stats.runs_cancelled);
                            println!("    Retries: {}", stats.retries);
                            println!("    Events processed: {}", stats.events_processed);
                        }
                        ChatCommand::Save(path) => {
                            let transcript = conversation.transcript();
                            match serde_json::to_string_pretty(&transcript)
                                .map_err(|e| e.to_string())
                                .and_then(|json| fs::write(&path, json).map_err(|e| e.to_string()))
                            {
                                Ok(()) => {
                                    print_info(&format!("Transcript saved to {path}"), use_color)
                                }
                                Err(err) => print_error(
                                    &format!("Failed to save transcript: {err}"),
                                    use_color,
                                ),
                            }
                        }
                        ChatCommand::Load(path) => {
                            match fs::read_to_string(&path)
                                .map_err(|e| e.to_string())
                                .and_then(|json| {
                                    serde_json::from_str::<Transcript>(&json)
                                        .map_err(|e| e.to_string())
                                })
                            {
                                Ok(transcript) => {
                                    conversation.restore_transcript(transcript);
                                    print_info(
                                        &format!("Transcript loaded from {path}"),
                                        use_color,
                                    );
                                }
                                Err(err) => print_error(
                                    &format!("Failed to load transcript: {err}"),
                                    use_color,
                                ),
                            }
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {line}");
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            print_error(&message, use_color);
                        }
                    }
                    continue;
                }

                // Regular message - submit a run.
                let stream = controller.submit(
                    line,
                    conversation.history(None),
                    document.clone(),
                    conversation.session_id().map(str::to_string),
                );
                let mut stream = match stream {
                    Ok(stream) => stream,
                    Err(err) => {
                        print_error(&err.to_string(), use_color);
                        continue;
                    }
                };
                conversation.append_message(ChatMessage::user(line));

                println!("Assistant:");
                let mut poll = tokio::time::interval(Duration::from_millis(100));
                loop {
                    tokio::select! {
                        update = stream.next_update() => match update {
                            None => break,
                            Some(RunUpdate::Progress(chunk)) => match chunk.kind {
                                ChunkKind::Thought => print_thought(&chunk.text, use_color),
                                ChunkKind::Analysis | ChunkKind::Response => {}
                            },
                            Some(RunUpdate::Complete(run)) => {
                                if let Some(session_id) = &run.session_id {
                                    conversation.update_session_id(session_id.clone());
                                }
                                println!("{}\n", run.response);
                                conversation.append_message(run.into_message());
                            }
                            Some(RunUpdate::Failed(failure)) => {
                                let message = failure.into_message();
                                print_error(&message.content, use_color);
                                conversation.append_message(message);
                            }
                        },
                        _ = poll.tick() => {
                            if interrupted.swap(false, Ordering::Relaxed) {
                                controller.cancel();
                                print_info("Run cancelled.", use_color);
                            }
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                print_error(&format!("Input error: {err}"), use_color);
                break;
            }
        }
    }

    Ok(())
}

fn print_thought(text: &str, use_color: bool) {
    if use_color {
        println!("  {ANSI_DIM}· {text}{ANSI_RESET}");
    } else {
        println!("  · {text}");
    }
}

fn print_info(message: &str, use_color: bool) {
    if use_color {
        println!("  {ANSI_DIM}{message}{ANSI_RESET}");
    } else {
        println!("  {message}");
    }
}

fn print_error(message: &str, use_color: bool) {
    if use_color {
        eprintln!("  {ANSI_RED}{message}{ANSI_RESET}");
    } else {
        eprintln!("  {message}");
    }
}
