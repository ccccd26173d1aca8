//! Error types for the agent loop

use thiserror::Error;

/// Result type alias for agent loop operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while driving a run
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model API call failed
    #[error("Model error: {0}")]
    Model(#[from] sitesmith_core::Error),

    /// Subprocess failure or non-empty error stream
    #[error("Command failed: {message}")]
    Command { message: String },

    /// Directory creation or file write failure
    #[error("File write failed: {message}")]
    FileWrite { message: String },

    /// File-write target does not resolve under the output directory
    #[error("Path escapes the output directory: {path}")]
    PathEscape { path: String },

    /// The run exceeded the configured turn cap
    #[error("Turn limit of {limit} exceeded")]
    TurnLimitExceeded { limit: u32 },

    /// Connection-level failure
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Create a Command error
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    /// Create a FileWrite error
    pub fn file_write(message: impl Into<String>) -> Self {
        Self::FileWrite {
            message: message.into(),
        }
    }

    /// Create a PathEscape error
    pub fn path_escape(path: impl Into<String>) -> Self {
        Self::PathEscape { path: path.into() }
    }

    /// Create a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}
