//! CLI surface: process arguments and the prompt's slash commands.

pub mod args;
pub mod command;
pub mod version;

pub use args::{parse_args, usage, CliCommand};
pub use command::{help_text, parse_input, PromptInput, SlashCommand};
pub use version::{version_string, VERSION};
