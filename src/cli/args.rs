//! Command-line argument parsing for lexchat.

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Run the interactive client (default)
    Run,
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use lexchat::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["lexchat".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    for arg in args.skip(1) {
        // Skip the program name
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            _ => {}
        }
    }
    CliCommand::Run
}

/// Usage text for `--help`.
pub fn usage() -> &'static str {
    "Usage: lexchat [--version | --help]

Environment:
  LEXCHAT_HTTP_URL        HTTP base URL (default http://localhost:8000)
  LEXCHAT_WS_URL          chat websocket URL (default ws://localhost:8000/ws/chat)
  LEXCHAT_QUIESCENCE_MS   silence before a reply counts as finished (default 1000)
  RUST_LOG                log filter for stderr (default warn)"
}
