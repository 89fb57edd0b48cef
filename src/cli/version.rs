//! Version command for lexchat.

/// The current version of lexchat, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version line printed by `--version`.
pub fn version_string() -> String {
    format!("lexchat {}", VERSION)
}
