//! Error types for conch.

use std::io;

/// Errors produced by the conch shell core.
#[derive(Debug, thiserror::Error)]
pub enum ConchError {
    #[error("command error: {0}")]
    Command(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Usage text for a command; printed as-is rather than as a failure.
    #[error("{0}")]
    Usage(String),

    #[error("parse error: {0}")]
    Parse(String),

    /// Input is well-formed so far but not finished (open quote or bracket).
    #[error("incomplete input: missing {0}")]
    Incomplete(String),

    /// Signature introspection failed; the message is shown verbatim.
    #[error("{0}")]
    Introspection(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConchError>;
