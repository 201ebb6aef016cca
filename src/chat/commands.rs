//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to inspect the conversation without sending messages
//! to the model.

/// A parsed chat command.
///
/// These commands control the REPL and are never sent as a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Reprint the transcript.
    History,

    /// Display controller statistics (message count, turns, chunks).
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use electrobot::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/history").is_some());
/// assert!(parse_command("Quel est le prix ?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "history" => ChatCommand::History,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "" => ChatCommand::Invalid("Missing command name after '/'".to_string()),
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    match (result, argument) {
        (ChatCommand::Invalid(msg), _) => Some(ChatCommand::Invalid(msg)),
        (_, Some(_)) => Some(ChatCommand::Invalid(format!(
            "/{command} does not take an argument"
        ))),
        (result, None) => Some(result),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /history               Reprint the conversation
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat

Anything else is sent to the assistant."#
}
