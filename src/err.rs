//! err

use std::io;
use thiserror::Error;

/// StressError
#[derive(Error, Debug)]
pub enum StressError {
    /// io error from the output sink or console
    #[error("io error: {0:?}")]
    Io(#[from] io::Error),

    /// config file could not be parsed
    #[error("parse config error: {0:?}")]
    Config(#[from] serde_json::Error),

    /// config values out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A `require!` check failed inside a test body
    #[error("{file}:{line} REQUIRE({expr})")]
    Assertion {
        /// source file of the check
        file: &'static str,
        /// source line of the check
        line: u32,
        /// the checked expression as written
        expr: &'static str,
    },

    /// task panicked while running on a worker
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// task was dropped before it ran
    #[error("task abandoned before completion")]
    TaskAbandoned,
}

/// Alias for a Result with the error type StressError.
pub type Result<T> = std::result::Result<T, StressError>;
