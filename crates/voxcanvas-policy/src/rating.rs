//! Combining stage verdicts into a final rating

use serde::Serialize;
use voxcanvas_core::{ModerationVerdict, RatingCategory};

/// Final decision for a generated image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingDecision {
    /// Highest category either stage assigned
    pub category: RatingCategory,

    /// Either stage found a policy violation
    pub blocked: bool,

    /// Reasons from both stages, first occurrence wins
    pub warnings: Vec<String>,
}

/// Folds the text and image verdicts.
///
/// Rating and blocking are independent: an `Adult` rating alone never blocks,
/// and a flagged verdict blocks whatever its rating.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingPolicy;

impl RatingPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Combine the two stage verdicts
    pub fn combine(&self, text: &ModerationVerdict, image: &ModerationVerdict) -> RatingDecision {
        let mut warnings: Vec<String> =
            Vec::with_capacity(text.reasons.len() + image.reasons.len());
        for reason in text.reasons.iter().chain(&image.reasons) {
            if !warnings.contains(reason) {
                warnings.push(reason.clone());
            }
        }

        RatingDecision {
            category: text.category.max(image.category),
            blocked: text.flagged || image.flagged,
            warnings,
        }
    }
}
