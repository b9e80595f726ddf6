//! Error types for VoxCanvas

use crate::types::EntryId;

/// Result type alias using VoxCanvas's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for VoxCanvas operations
///
/// Policy blocks and generation failures are not errors: they end a run with a
/// `Rejected` outcome. Errors are reserved for conditions the caller must
/// handle itself.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Prompt text was empty after trimming
    #[error("prompt is empty")]
    EmptyPrompt,

    /// An external classification call could not be completed
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// The transcription collaborator failed; surfaced unchanged
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// A run was started while another run of the same session was in flight
    #[error("a pipeline run is already in progress for this session")]
    RunInProgress,

    /// The session ended before the run reached a terminal state
    #[error("pipeline run cancelled")]
    Cancelled,

    /// An entry with this id is already in the gallery
    #[error("duplicate gallery entry id: {0}")]
    DuplicateEntry(EntryId),

    /// Blocked results can never enter the gallery
    #[error("blocked entries cannot be added to the gallery")]
    BlockedEntry,

    /// Operation timed out
    #[error("operation timed out")]
    Timeout,

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new classifier-unavailable error
    pub fn classifier_unavailable(msg: impl Into<String>) -> Self {
        Self::ClassifierUnavailable(msg.into())
    }

    /// Create a new transcription error
    pub fn transcription(msg: impl Into<String>) -> Self {
        Self::Transcription(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
