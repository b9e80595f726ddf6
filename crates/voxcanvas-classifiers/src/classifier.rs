//! External classifier seams and common types

use crate::thresholds::ThresholdTable;
use async_trait::async_trait;
use voxcanvas_core::{ImageHandle, ModerationVerdict, Prompt, RatingCategory, Result};

/// Confidence assumed when a provider reports none
const DEFAULT_REPORT_CONFIDENCE: f32 = 0.5;

/// External text classification service
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Score the given prompt text
    async fn classify_text(&self, text: &str) -> Result<SeverityReport>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// External image classification service
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Score a generated image; the originating prompt is available as context
    async fn classify_image(&self, image: &ImageHandle, prompt: &Prompt) -> Result<SeverityReport>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Raw output of an external classifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeverityReport {
    /// Severity on the provider's scale, normalized to 0.0-1.0
    pub severity: f32,

    /// Provider judged the content an acceptable-use violation
    pub violation: bool,

    /// Explicit rating returned by the provider, if any
    pub rating_hint: Option<RatingCategory>,

    /// Human-readable reasons
    pub reasons: Vec<String>,

    /// Provider confidence (0.0-1.0), if reported
    pub confidence: Option<f32>,
}

impl SeverityReport {
    /// Create a report with the given severity
    pub fn new(severity: f32) -> Self {
        Self {
            severity,
            ..Default::default()
        }
    }

    /// Mark the content as policy-violating
    pub fn violation(mut self) -> Self {
        self.violation = true;
        self
    }

    /// Attach an explicit provider rating
    pub fn with_rating_hint(mut self, rating: RatingCategory) -> Self {
        self.rating_hint = Some(rating);
        self
    }

    /// Append a reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }

    /// Set provider confidence
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Convert into a verdict using the given calibration.
    ///
    /// The rating is the higher of the bucketed severity and the provider's
    /// explicit hint. A violation without reasons gets one naming the
    /// classifier, so a block is never reported without explanation.
    pub fn into_verdict(self, thresholds: &ThresholdTable, classifier: &str) -> ModerationVerdict {
        let category = thresholds
            .categorize(self.severity)
            .max(self.rating_hint.unwrap_or_default());

        let mut reasons = self.reasons;
        if self.violation && reasons.is_empty() {
            reasons.push(format!("content flagged by {}", classifier));
        }

        let mut verdict = ModerationVerdict::rated(
            category,
            self.confidence.unwrap_or(DEFAULT_REPORT_CONFIDENCE),
        );
        verdict.flagged = self.violation;
        verdict.reasons = reasons;
        verdict
    }
}

/// Where a stage's verdict came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    /// Local high-severity override; the classifier was not consulted
    Override,
    /// External classifier output
    Classifier,
    /// Classifier unavailable or timed out; fail-safe default applied
    Fallback,
}

impl VerdictSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Classifier => "classifier",
            Self::Fallback => "fallback",
        }
    }
}

/// Verdict of one moderation stage plus how it was reached
#[derive(Debug, Clone)]
pub struct Assessment {
    /// The verdict handed downstream
    pub verdict: ModerationVerdict,

    /// How the verdict was produced
    pub source: VerdictSource,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl Assessment {
    /// True when the fail-safe default was applied
    pub fn is_fallback(&self) -> bool {
        self.source == VerdictSource::Fallback
    }
}
