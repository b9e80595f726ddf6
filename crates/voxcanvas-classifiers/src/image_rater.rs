//! Generated image rating stage

use crate::classifier::{Assessment, ImageClassifier, SeverityReport, VerdictSource};
use crate::config::ModerationConfig;
use crate::thresholds::ThresholdTable;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use voxcanvas_core::{Error, ImageHandle, ModerationVerdict, Prompt, RatingCategory, Result};

/// Reason attached when the image could not be classified
pub const IMAGE_UNVERIFIED_REASON: &str = "image unverified — inherited text rating";

/// Rates generated images through an external vision classifier.
///
/// If the classifier fails the image inherits the rating its prompt already
/// received, so an outage can never rate an image below its prompt.
pub struct ImageRater {
    classifier: Arc<dyn ImageClassifier>,
    thresholds: ThresholdTable,
}

impl ImageRater {
    /// Create a new image rater
    pub fn new(classifier: Arc<dyn ImageClassifier>, config: &ModerationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier,
            thresholds: config.image_thresholds,
        })
    }

    /// Rate an image. `text_rating` is the category the prompt received.
    pub async fn evaluate(
        &self,
        image: &ImageHandle,
        prompt: &Prompt,
        text_rating: RatingCategory,
        timeout: Duration,
    ) -> Assessment {
        let start = Instant::now();

        let (verdict, source) = match self.classify(image, prompt, timeout).await {
            Ok(report) => (
                report.into_verdict(&self.thresholds, self.classifier.name()),
                VerdictSource::Classifier,
            ),
            Err(e) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Image classifier unavailable, inheriting text rating"
                );
                metrics::counter!("voxcanvas_fallbacks_total", "stage" => "image").increment(1);
                (
                    ModerationVerdict::rated(text_rating, 0.0).with_reason(IMAGE_UNVERIFIED_REASON),
                    VerdictSource::Fallback,
                )
            }
        };

        debug!(
            category = %verdict.category,
            flagged = verdict.flagged,
            source = source.as_str(),
            "Image rated"
        );

        Assessment {
            verdict,
            source,
            latency_us: start.elapsed().as_micros() as u64,
        }
    }

    async fn classify(
        &self,
        image: &ImageHandle,
        prompt: &Prompt,
        timeout: Duration,
    ) -> Result<SeverityReport> {
        match tokio::time::timeout(timeout, self.classifier.classify_image(image, prompt)).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e @ Error::ClassifierUnavailable(_))) => Err(e),
            Ok(Err(e)) => Err(Error::classifier_unavailable(e.to_string())),
            Err(_) => Err(Error::Timeout),
        }
    }
}
