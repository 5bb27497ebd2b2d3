//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to inspect the conversation, search stored documents and
//! upload new ones without sending a chat message.

/// A parsed chat command.
///
/// None of these commands add to the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Reprint the conversation so far.
    History,

    /// Show the session id, or that the conversation is unsaved.
    Session,

    /// Display conversation statistics.
    Stats,

    /// Search uploaded documents.
    Search(String),

    /// Upload a text file for later searches.
    Upload(String),

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
/// # use threadweaver::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/history").is_some());
/// assert!(parse_command("What changed last week?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => no_argument(ChatCommand::Help, "/help", argument),
        "quit" | "exit" | "q" => no_argument(ChatCommand::Quit, "/quit", argument),
        "history" => no_argument(ChatCommand::History, "/history", argument),
        "session" => no_argument(ChatCommand::Session, "/session", argument),
        "stats" | "status" => no_argument(ChatCommand::Stats, "/stats", argument),
        "search" => match argument {
            Some(query) => ChatCommand::Search(query.to_string()),
            None => ChatCommand::Invalid("Usage: /search <query>".to_string()),
        },
        "upload" => match argument {
            Some(path) => ChatCommand::Upload(path.to_string()),
            None => ChatCommand::Invalid("Usage: /upload <file.txt>".to_string()),
        },
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn no_argument(command: ChatCommand, name: &str, argument: Option<&str>) -> ChatCommand {
    match argument {
        None => command,
        Some(_) => ChatCommand::Invalid(format!("{} takes no arguments", name)),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /history               Show the conversation so far
  /session               Show the current session id
  /stats                 Show conversation statistics
  /search <query>        Search uploaded documents
  /upload <file.txt>     Upload a text file for search
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /QUIT  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_inspection_commands() {
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/session"), Some(ChatCommand::Session));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn rejects_arguments() {
        assert_eq!(
            parse_command("/history all"),
            Some(ChatCommand::Invalid(
                "/history takes no arguments".to_string()
            ))
        );
    }

    #[test]
    fn document_commands_need_an_argument() {
        assert_eq!(
            parse_command("/search Release Notes "),
            Some(ChatCommand::Search("Release Notes".to_string()))
        );
        assert_eq!(
            parse_command("/UPLOAD ./Notes/March.txt"),
            Some(ChatCommand::Upload("./Notes/March.txt".to_string()))
        );
        assert_eq!(
            parse_command("/search"),
            Some(ChatCommand::Invalid("Usage: /search <query>".to_string()))
        );
        assert!(matches!(
            parse_command("/upload   "),
            Some(ChatCommand::Invalid(msg)) if msg.starts_with("Usage: /upload")
        ));
    }

    #[test]
    fn unknown_command() {
        assert!(matches!(
            parse_command("/clear"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("/clear")
        ));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_lists_commands() {
        let help = help_text();
        for command in [
            "/history", "/session", "/stats", "/search", "/upload", "/help", "/quit",
        ] {
            assert!(help.contains(command));
        }
    }
}
