//! Error handling module for archstrap
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Three kinds of failure exist: invalid values (re-prompted, never surfaced
//! during an interactive run), failed external commands (fatal), and operator
//! cancellation (exit 1).

use thiserror::Error;

/// Main error type for archstrap
#[derive(Error, Debug)]
pub enum InstallerError {
    /// IO errors (file edits, prompts, symlinks)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A disk path not of the form `/dev/[a-z]+`
    #[error("Invalid disk path: {0}")]
    InvalidDisk(String),

    /// A partition path not of the form `/dev/[a-z]+N`
    #[error("Invalid disk partition path: {0}")]
    InvalidPartition(String),

    /// Byte counts must be strictly positive
    #[error("Byte count must be a positive integer, got {0}")]
    InvalidByteCount(i64),

    /// Hostnames are limited to `[a-z0-9-]`
    #[error("Invalid hostname: {0:?}")]
    InvalidHostname(String),

    /// Usernames are limited to ASCII word characters
    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    /// The external program could not be started at all
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran and exited unsuccessfully
    #[error("Command `{command}` failed with exit code {}", code.map_or_else(|| "none (killed by signal)".to_string(), |c| c.to_string()))]
    CommandFailed { command: String, code: Option<i32> },

    /// A system probe produced output that could not be understood
    #[error("Probe error: {0}")]
    Probe(String),

    /// A search pattern built from configuration did not compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration errors (loading, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The operator declined the installation or closed standard input
    #[error("Installation cancelled by operator")]
    Cancelled,
}

/// Result type alias for archstrap operations
pub type Result<T> = std::result::Result<T, InstallerError>;

impl InstallerError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a probe error
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Process exit status this error should terminate the installer with.
    ///
    /// A failed command propagates its own exit code; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
