//! Slash commands typed at the prompt.
//!
//! Anything that does not start with `/` is sent as a chat turn.

use std::path::PathBuf;

use crate::app::UserCommand;
use crate::models::SessionId;

/// All slash commands the prompt understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    /// Start a new conversation
    /// Primary: /new
    /// Aliases: /clear
    New,

    /// Fetch and list sessions
    /// Primary: /sessions
    /// Aliases: /refresh
    Sessions,

    /// Switch to a session
    /// Primary: /open <id>
    Open,

    /// Upload a document for summarization
    /// Primary: /upload <path>
    Upload,

    /// Print the current transcript
    /// Primary: /history
    History,

    /// Show command help
    /// Primary: /help
    Help,

    /// Close the connection and exit
    /// Primary: /quit
    /// Aliases: /exit
    Quit,
}

impl SlashCommand {
    pub fn all() -> Vec<Self> {
        vec![
            SlashCommand::New,
            SlashCommand::Sessions,
            SlashCommand::Open,
            SlashCommand::Upload,
            SlashCommand::History,
            SlashCommand::Help,
            SlashCommand::Quit,
        ]
    }

    /// The primary command name, without the leading slash.
    pub fn name(&self) -> &'static str {
        match self {
            SlashCommand::New => "new",
            SlashCommand::Sessions => "sessions",
            SlashCommand::Open => "open",
            SlashCommand::Upload => "upload",
            SlashCommand::History => "history",
            SlashCommand::Help => "help",
            SlashCommand::Quit => "quit",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            SlashCommand::New => &["clear"],
            SlashCommand::Sessions => &["refresh"],
            SlashCommand::Quit => &["exit"],
            _ => &[],
        }
    }

    /// Argument placeholder shown in help, if the command takes one.
    pub fn argument(&self) -> Option<&'static str> {
        match self {
            SlashCommand::Open => Some("<session-id>"),
            SlashCommand::Upload => Some("<path>"),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SlashCommand::New => "Start a new conversation",
            SlashCommand::Sessions => "Fetch and list past sessions",
            SlashCommand::Open => "Switch to a session and load its history",
            SlashCommand::Upload => "Upload a document and stream its summary",
            SlashCommand::History => "Print the current transcript",
            SlashCommand::Help => "Show this help",
            SlashCommand::Quit => "Close the connection and exit",
        }
    }

    /// Look up a command by name or alias.
    ///
    /// Accepts the name with or without the leading slash, case-insensitive.
    pub fn parse(input: &str) -> Option<Self> {
        let name = input.trim();
        let name = name.strip_prefix('/').unwrap_or(name).to_lowercase();

        Self::all()
            .into_iter()
            .find(|cmd| cmd.name() == name || cmd.aliases().contains(&name.as_str()))
    }
}

/// What one line of prompt input asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptInput {
    /// Forward to the App
    Command(UserCommand),
    /// Print help locally
    Help,
    /// Blank line
    Empty,
    /// Unknown command or missing argument
    Invalid(String),
}

/// Parse one line typed at the prompt.
pub fn parse_input(line: &str) -> PromptInput {
    let line = line.trim();
    if line.is_empty() {
        return PromptInput::Empty;
    }
    if !line.starts_with('/') {
        return PromptInput::Command(UserCommand::Send(line.to_string()));
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    let Some(command) = SlashCommand::parse(name) else {
        return PromptInput::Invalid(format!("Unknown command: {}", name));
    };

    if let Some(placeholder) = command.argument() {
        if arg.is_empty() {
            return PromptInput::Invalid(format!("Usage: /{} {}", command.name(), placeholder));
        }
    }

    let user_command = match command {
        SlashCommand::New => UserCommand::NewConversation,
        SlashCommand::Sessions => UserCommand::RefreshSessions,
        SlashCommand::Open => UserCommand::SelectSession(SessionId::new(arg)),
        SlashCommand::Upload => UserCommand::Upload(PathBuf::from(arg)),
        SlashCommand::History => UserCommand::ShowTranscript,
        SlashCommand::Help => return PromptInput::Help,
        SlashCommand::Quit => UserCommand::Shutdown,
    };
    PromptInput::Command(user_command)
}

/// Help text listing every command.
pub fn help_text() -> String {
    let mut lines = vec!["Commands:".to_string()];
    for cmd in SlashCommand::all() {
        let usage = match cmd.argument() {
            Some(arg) => format!("/{} {}", cmd.name(), arg),
            None => format!("/{}", cmd.name()),
        };
        let aliases = cmd
            .aliases()
            .iter()
            .map(|a| format!("/{}", a))
            .collect::<Vec<_>>()
            .join(", ");
        if aliases.is_empty() {
            lines.push(format!("  {:<24} {}", usage, cmd.description()));
        } else {
            lines.push(format!(
                "  {:<24} {} (also {})",
                usage,
                cmd.description(),
                aliases
            ));
        }
    }
    lines.push("Anything else is sent as a chat message.".to_string());
    lines.join("\n")
}
