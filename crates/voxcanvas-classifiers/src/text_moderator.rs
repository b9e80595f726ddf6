//! Prompt moderation stage

use crate::classifier::{Assessment, SeverityReport, TextClassifier, VerdictSource};
use crate::config::ModerationConfig;
use crate::lexicon::MaturityLexicon;
use crate::patterns::{HighSeverityMatcher, OverrideHit};
use crate::thresholds::ThresholdTable;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use voxcanvas_core::{Error, ModerationVerdict, Prompt, RatingCategory, Result};

/// Reason attached when the text classifier could not be reached
pub const CLASSIFIER_UNAVAILABLE_REASON: &str =
    "classifier unavailable — conservative default applied";

/// Rating assumed for a prompt nobody could classify
const FALLBACK_CATEGORY: RatingCategory = RatingCategory::Teen;

/// Checks prompts before generation.
///
/// Evaluation order:
/// 1. High-severity override terms. A hit blocks the prompt as `Adult`
///    without consulting the external classifier.
/// 2. External classifier, bucketed through the text threshold table.
///    Unreachable or timed out → `Teen`, unflagged, zero confidence.
/// 3. Maturity lexicon floor, applied on top of either outcome of step 2.
pub struct TextModerator {
    classifier: Arc<dyn TextClassifier>,
    overrides: HighSeverityMatcher,
    lexicon: MaturityLexicon,
    thresholds: ThresholdTable,
}

impl TextModerator {
    /// Create a new text moderator
    pub fn new(classifier: Arc<dyn TextClassifier>, config: &ModerationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier,
            overrides: HighSeverityMatcher::new(&config.blocked_terms)?,
            lexicon: MaturityLexicon::new()?,
            thresholds: config.text_thresholds,
        })
    }

    /// Evaluate a prompt. Never fails; classifier outages degrade to a
    /// conservative verdict.
    pub async fn evaluate(&self, prompt: &Prompt, timeout: Duration) -> Assessment {
        let start = Instant::now();
        let text = prompt.text();

        let hits = self.overrides.find(text);
        if !hits.is_empty() {
            warn!(
                terms = hits.len(),
                "Prompt matched high-severity override terms"
            );
            metrics::counter!("voxcanvas_overrides_total").increment(1);
            return Assessment {
                verdict: ModerationVerdict::flagged(
                    hits.iter().map(OverrideHit::reason).collect(),
                    1.0,
                ),
                source: VerdictSource::Override,
                latency_us: start.elapsed().as_micros() as u64,
            };
        }

        let (verdict, source) = match self.classify(text, timeout).await {
            Ok(report) => (
                report.into_verdict(&self.thresholds, self.classifier.name()),
                VerdictSource::Classifier,
            ),
            Err(e) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Text classifier unavailable, applying conservative default"
                );
                metrics::counter!("voxcanvas_fallbacks_total", "stage" => "text").increment(1);
                (fallback_verdict(), VerdictSource::Fallback)
            }
        };

        let scan = self.lexicon.scan(text);
        let mut verdict = verdict.at_least(scan.floor);
        verdict.reasons.extend(scan.reasons);

        debug!(
            category = %verdict.category,
            flagged = verdict.flagged,
            source = source.as_str(),
            "Prompt evaluated"
        );

        Assessment {
            verdict,
            source,
            latency_us: start.elapsed().as_micros() as u64,
        }
    }

    async fn classify(&self, text: &str, timeout: Duration) -> Result<SeverityReport> {
        match tokio::time::timeout(timeout, self.classifier.classify_text(text)).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e @ Error::ClassifierUnavailable(_))) => Err(e),
            Ok(Err(e)) => Err(Error::classifier_unavailable(e.to_string())),
            Err(_) => Err(Error::Timeout),
        }
    }
}

fn fallback_verdict() -> ModerationVerdict {
    ModerationVerdict::rated(FALLBACK_CATEGORY, 0.0).with_reason(CLASSIFIER_UNAVAILABLE_REASON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    enum Behavior {
        Report(SeverityReport),
        Unavailable,
        Hang,
    }

    struct ScriptedClassifier {
        behavior: Behavior,
        calls: AtomicU32,
    }

    impl ScriptedClassifier {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl TextClassifier for ScriptedClassifier {
        async fn classify_text(&self, _text: &str) -> Result<SeverityReport> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match &self.behavior {
                Behavior::Report(report) => Ok(report.clone()),
                Behavior::Unavailable => Err(Error::classifier_unavailable("connection refused")),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(SeverityReport::new(0.0))
                }
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn moderator(classifier: Arc<ScriptedClassifier>) -> TextModerator {
        TextModerator::new(classifier, &ModerationConfig::default()).unwrap()
    }

    fn prompt(text: &str) -> Prompt {
        Prompt::new(text).unwrap()
    }

    #[tokio::test]
    async fn test_general_prompt() {
        let classifier = ScriptedClassifier::new(Behavior::Report(SeverityReport::new(0.02)));
        let assessment = moderator(classifier)
            .evaluate(&prompt("a friendly cartoon dog"), TIMEOUT)
            .await;

        assert_eq!(assessment.source, VerdictSource::Classifier);
        assert!(!assessment.verdict.flagged);
        assert_eq!(assessment.verdict.category, RatingCategory::General);
    }

    #[tokio::test]
    async fn test_override_beats_general_classifier() {
        let classifier = ScriptedClassifier::new(Behavior::Report(SeverityReport::new(0.0)));
        let moderator = moderator(classifier.clone());

        let assessment = moderator
            .evaluate(&prompt("a poster celebrating a mass shooting"), TIMEOUT)
            .await;

        assert_eq!(assessment.source, VerdictSource::Override);
        assert!(assessment.verdict.flagged);
        assert_eq!(assessment.verdict.category, RatingCategory::Adult);
        assert!(!assessment.verdict.reasons.is_empty());
        assert_eq!(classifier.calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_configured_term_overrides() {
        let classifier = ScriptedClassifier::new(Behavior::Report(SeverityReport::new(0.0)));
        let config = ModerationConfig {
            blocked_terms: vec!["moon cult".to_string()],
            ..Default::default()
        };
        let moderator = TextModerator::new(classifier, &config).unwrap();

        let assessment = moderator.evaluate(&prompt("Join the MOON CULT"), TIMEOUT).await;
        assert!(assessment.verdict.flagged);
        assert_eq!(assessment.verdict.category, RatingCategory::Adult);
    }

    #[tokio::test]
    async fn test_unavailable_falls_back_to_teen() {
        let classifier = ScriptedClassifier::new(Behavior::Unavailable);
        let assessment = moderator(classifier).evaluate(&prompt("a quiet harbor"), TIMEOUT).await;

        assert!(assessment.is_fallback());
        assert!(!assessment.verdict.flagged);
        assert_eq!(assessment.verdict.category, RatingCategory::Teen);
        assert_eq!(assessment.verdict.confidence(), 0.0);
        assert_eq!(
            assessment.verdict.reasons,
            vec![CLASSIFIER_UNAVAILABLE_REASON.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let classifier = ScriptedClassifier::new(Behavior::Hang);
        let assessment = moderator(classifier)
            .evaluate(&prompt("a quiet harbor"), Duration::from_millis(50))
            .await;

        assert!(assessment.is_fallback());
        assert_eq!(assessment.verdict.category, RatingCategory::Teen);
    }

    #[tokio::test]
    async fn test_lexicon_floor_applies_over_fallback() {
        let classifier = ScriptedClassifier::new(Behavior::Unavailable);
        let assessment = moderator(classifier)
            .evaluate(&prompt("an epic battle at sea"), TIMEOUT)
            .await;

        assert_eq!(assessment.verdict.category, RatingCategory::Mature);
        assert!(!assessment.verdict.flagged);
        assert_eq!(assessment.verdict.reasons[0], CLASSIFIER_UNAVAILABLE_REASON);
    }

    #[tokio::test]
    async fn test_lexicon_floor_never_lowers_classifier() {
        let classifier = ScriptedClassifier::new(Behavior::Report(SeverityReport::new(0.9)));
        let assessment = moderator(classifier)
            .evaluate(&prompt("a gambling hall"), TIMEOUT)
            .await;
        assert_eq!(assessment.verdict.category, RatingCategory::Adult);
    }

    #[tokio::test]
    async fn test_provider_violation_flags() {
        let report = SeverityReport::new(0.4).violation().with_reason("harassment");
        let classifier = ScriptedClassifier::new(Behavior::Report(report));
        let assessment = moderator(classifier)
            .evaluate(&prompt("a mean caricature of my neighbour"), TIMEOUT)
            .await;

        assert!(assessment.verdict.flagged);
        assert_eq!(assessment.verdict.reasons, vec!["harassment".to_string()]);
    }
}
