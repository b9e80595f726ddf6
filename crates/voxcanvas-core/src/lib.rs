//! VoxCanvas Core
//!
//! Core types shared across the VoxCanvas moderation pipeline.
//!
//! This crate provides:
//! - The ordered age-rating scale and classifier verdicts
//! - Prompts with their transcript/edit history
//! - Opaque audio and image handles passed through to collaborators
//! - Gallery entries and view filters
//! - Error types and result handling

pub mod error;
pub mod prompt;
pub mod types;

pub use error::{Error, Result};
pub use prompt::{Prompt, PromptAdvice, MAX_PROMPT_CHARS};
pub use types::{
    AudioClip, EntryId, GalleryEntry, GalleryView, ImageHandle, ModerationVerdict,
    RatingCategory,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::prompt::Prompt;
    pub use crate::types::{
        AudioClip, EntryId, GalleryEntry, GalleryView, ImageHandle, ModerationVerdict,
        RatingCategory,
    };
}
