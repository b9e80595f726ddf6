//! VoxCanvas Classifiers
//!
//! The two moderation stages that gate image generation:
//! - [`TextModerator`] checks a prompt before anything is generated
//! - [`ImageRater`] rates the generated image afterwards
//!
//! Both delegate to external classification services through the traits in
//! [`classifier`], map the returned severity onto the rating scale with an
//! explicit [`ThresholdTable`], and degrade to conservative verdicts when the
//! service is unreachable. The text stage additionally carries a local
//! high-severity override that no classifier output can bypass.

pub mod classifier;
pub mod config;
pub mod image_rater;
pub mod lexicon;
pub mod patterns;
pub mod text_moderator;
pub mod thresholds;

pub use classifier::{Assessment, ImageClassifier, SeverityReport, TextClassifier, VerdictSource};
pub use config::ModerationConfig;
pub use image_rater::{ImageRater, IMAGE_UNVERIFIED_REASON};
pub use lexicon::MaturityLexicon;
pub use patterns::{HighSeverityMatcher, SeverityFamily};
pub use text_moderator::{TextModerator, CLASSIFIER_UNAVAILABLE_REASON};
pub use thresholds::ThresholdTable;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Assessment, ImageClassifier, SeverityReport, TextClassifier};
    pub use crate::config::ModerationConfig;
    pub use crate::image_rater::ImageRater;
    pub use crate::text_moderator::TextModerator;
    pub use crate::thresholds::ThresholdTable;
}
