//! External collaborators invoked by the pipeline
//!
//! Speech recognition and image synthesis happen outside this workspace.
//! Implementations wrap whatever provider is in use and collapse its failures
//! into the error kinds below.

use async_trait::async_trait;
use voxcanvas_core::{AudioClip, ImageHandle};
use voxcanvas_policy::Retryable;

/// Speech-to-text service
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a clip into prompt text
    async fn transcribe(&self, audio: &AudioClip) -> Result<String, TranscriptionError>;

    /// Get the service name
    fn name(&self) -> &str;
}

/// Text-to-image service
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for the prompt text
    async fn generate(&self, prompt: &str) -> Result<ImageHandle, GenerationError>;

    /// Get the service name
    fn name(&self) -> &str;
}

/// Transcription failure, passed to the caller unchanged
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TranscriptionError {
    pub message: String,
}

impl TranscriptionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Any non-success from the image generator.
///
/// Every variant keeps the provider's message so it can be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The provider refused the prompt under its own content policy
    #[error("content violates provider policy: {0}")]
    ContentPolicy(String),

    /// Billing or quota exhausted
    #[error("quota exceeded or billing issue: {0}")]
    Quota(String),

    /// Provider rate limit hit
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Transport failure reaching the provider
    #[error("network error: {0}")]
    Network(String),

    /// No response within the caller's deadline
    #[error("generation timed out")]
    Timeout,

    /// Anything else
    #[error("image generation failed: {0}")]
    Other(String),
}

impl GenerationError {
    /// Classify a raw provider error message
    pub fn from_provider_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("content_policy_violation") {
            Self::ContentPolicy(message)
        } else if lower.contains("billing") || lower.contains("quota") {
            Self::Quota(message)
        } else if lower.contains("rate_limit") || lower.contains("rate limit") {
            Self::RateLimited(message)
        } else {
            Self::Other(message)
        }
    }

    /// Suggested next step for the user
    pub fn hint(&self) -> &'static str {
        match self {
            Self::ContentPolicy(_) => "Please try a different prompt.",
            Self::Quota(_) => "Please check the image provider account.",
            Self::RateLimited(_) => "Please wait a moment and try again.",
            Self::Network(_) | Self::Timeout | Self::Other(_) => "Please try again.",
        }
    }
}

/// Refusals and exhausted quota fail the same way on every call; everything
/// else, including unclassified provider errors, gets the one retry.
impl Retryable for GenerationError {
    fn is_transient(&self) -> bool {
        !matches!(self, Self::ContentPolicy(_) | Self::Quota(_))
    }
}
