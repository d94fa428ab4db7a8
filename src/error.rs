use std::path::PathBuf;
use thiserror::Error;

/// Exit code for successful execution (including an interrupted follow)
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors (unreadable handle, failed signal setup)
pub const EXIT_ERROR: i32 = 1;

/// Exit code for invalid arguments (bad sleep interval)
pub const EXIT_INVALID_ARGS: i32 = 2;

/// Custom error type for followname
#[derive(Error, Debug)]
pub enum FollowError {
    /// I/O failure on a handle that was already open.
    ///
    /// Open failures never surface here: a missing or unreadable path is
    /// retried at the poll interval instead.
    #[error("I/O error for '{path}': {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Sleep interval that cannot be turned into a duration
    #[error("Invalid sleep interval '{value}'. Expected a non-negative number of seconds")]
    InvalidInterval { value: f64 },

    /// Interrupt handler could not be installed
    #[error("Failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl FollowError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FollowError::InvalidInterval { .. } => EXIT_INVALID_ARGS,
            _ => EXIT_ERROR,
        }
    }

    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        FollowError::Io {
            source,
            path: path.into(),
        }
    }
}
