//! Error types for the reduction engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while driving a reduction.
///
/// Everything here is fatal: an oracle *rejecting* a trial is the normal
/// outcome of most trials and is reported as a [`crate::harness::Verdict`],
/// never as an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The oracle script is missing, not a file, or not executable.
    #[error("oracle script {path} is missing or not executable")]
    BadOracle { path: PathBuf },

    /// A method name that is not in the registry was requested.
    #[error("unknown reduction method: {0}")]
    UnknownMethod(String),

    /// The oracle rejected the last accepted program. The backup must
    /// stay interesting at all times; this indicates a flaky oracle or
    /// external interference with the working files.
    #[error("oracle rejected the last accepted program before a {method} pass")]
    SanityCheckFailed { method: String },

    /// A method flagged non-enlarging produced a longer program that the
    /// oracle accepted. This is a bug in the method.
    #[error("method {method} grew the program from {old} to {new} bytes but is flagged non-enlarging")]
    ContractViolation {
        method: String,
        old: usize,
        new: usize,
    },

    /// An external tool (the oracle or the pretty-printer) could not be
    /// spawned.
    #[error("failed to run {tool}: {source}")]
    Tool {
        tool: String,
        source: std::io::Error,
    },

    /// Reading or writing one of the working files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A buffer load or save failed.
    #[error(transparent)]
    Core(#[from] whittle_core::CoreError),

    /// Writing the run report failed.
    #[error("report serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
