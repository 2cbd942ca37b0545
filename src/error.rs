//! Error types for worktree operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::process::FailureKind;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the core. Upstream reconciliation and auto-fetch
/// problems never appear here: they are logged and swallowed.
#[derive(Debug, Error)]
pub enum Error {
    /// No repository was found walking up from the start directory
    #[error("Not a git repository (or any parent up to the filesystem root): {}", start.display())]
    NotARepository { start: PathBuf },

    /// A repository was found but its metadata store is unusable
    #[error("Invalid repository at {}: {reason}", path.display())]
    InvalidRepository { path: PathBuf, reason: String },

    #[error("Failed to create worktree for branch '{branch}' ({kind}): {cause}")]
    WorktreeCreationFailed {
        branch: String,
        kind: FailureKind,
        cause: String,
    },

    #[error("Failed to remove worktree {} ({kind}): {cause}", path.display())]
    WorktreeRemovalFailed {
        path: PathBuf,
        kind: FailureKind,
        cause: String,
    },

    #[error("Failed to list worktrees ({kind}): {cause}")]
    ListFailed { kind: FailureKind, cause: String },

    #[error("Unknown setting '{0}'")]
    UnknownSetting(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
