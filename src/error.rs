//! Error types for unilist.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnilistError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// The engine's own uniqueness/routing contract was broken. This is a
    /// defect in the engine, not in the input: the run aborts with no
    /// partial output, because a silently corrupted unified list is worse
    /// than no list.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
