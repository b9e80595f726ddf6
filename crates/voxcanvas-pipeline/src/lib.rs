//! VoxCanvas Pipeline
//!
//! Turns a spoken or typed prompt into a rated gallery entry, or a rejection
//! with reasons. The run is strictly sequential:
//!
//! 1. optional transcription of the recorded clip
//! 2. text moderation; a flagged prompt never reaches the generator
//! 3. image generation, retried once on transient failure
//! 4. image rating, falling back to the prompt's rating
//! 5. the combined rating decision and the gallery append
//!
//! Collaborators (speech recognition, image synthesis, classifiers) are
//! injected as trait objects; this crate owns none of them.

pub mod gallery;
pub mod pipeline;
pub mod recorder;
pub mod services;
pub mod session;

pub use gallery::{Gallery, GalleryListing};
pub use pipeline::{
    Pipeline, PipelineConfig, PipelineInput, PipelineStage, Rejection, RejectionKind, RunOutcome,
    GENERATION_FAILED_REASON, MAX_GENERATION_ATTEMPTS,
};
pub use recorder::RunRecorder;
pub use services::{GenerationError, ImageGenerator, Transcriber, TranscriptionError};
pub use session::Session;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::gallery::{Gallery, GalleryListing};
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineInput, RunOutcome};
    pub use crate::services::{GenerationError, ImageGenerator, Transcriber};
    pub use crate::session::Session;
}
