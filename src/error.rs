use std::io;

/// Custom error type for hookd operations
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("can't decode payload: {0}")]
    PayloadDecode(String),

    #[error("can't parse rule '{0}': missing '='")]
    RuleSyntax(String),

    #[error("can't compile pattern '{pattern}': {source}")]
    PatternCompile {
        pattern: String,
        source: regex::Error,
    },

    #[error("command '{command}' failed: {reason}")]
    Execution {
        command: String,
        reason: String,
        /// Combined stdout/stderr captured before the command failed.
        output: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Helper type for Results that use HookError
pub type Result<T> = std::result::Result<T, HookError>;
