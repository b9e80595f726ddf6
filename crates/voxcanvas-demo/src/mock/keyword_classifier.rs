use async_trait::async_trait;
use voxcanvas_classifiers::{ImageClassifier, SeverityReport, TextClassifier};
use voxcanvas_core::{Error, ImageHandle, Prompt, Result};

/// Weighted keywords; severity is the heaviest match
const KEYWORDS: &[(&str, f32)] = &[
    ("gore", 0.95),
    ("nude", 0.8),
    ("naked", 0.8),
    ("explicit", 0.8),
    ("blood", 0.55),
    ("weapon", 0.5),
    ("battle", 0.45),
    ("horror", 0.4),
    ("sword", 0.35),
    ("skull", 0.3),
    ("scary", 0.3),
    ("drugs", 0.3),
];

/// Severity at which the mock reports a policy violation
const VIOLATION_SEVERITY: f32 = 0.9;

/// Keyword-weight classifier for both stages.
///
/// Mock images depict their prompt, so the image side scores the prompt the
/// generator actually used.
pub struct KeywordClassifier {
    available: bool,
}

impl KeywordClassifier {
    pub fn new(available: bool) -> Self {
        Self { available }
    }

    fn score(&self, text: &str) -> Result<SeverityReport> {
        if !self.available {
            return Err(Error::classifier_unavailable("mock classifier offline"));
        }

        let lower = text.to_lowercase();
        let mut report = SeverityReport::new(0.0).with_confidence(0.8);
        let mut severity: f32 = 0.0;

        for (keyword, weight) in KEYWORDS {
            if lower.contains(keyword) {
                severity = severity.max(*weight);
                report = report.with_reason(format!("mentions '{}'", keyword));
            }
        }

        report.severity = severity;
        if severity >= VIOLATION_SEVERITY {
            report = report.violation();
        }
        Ok(report)
    }
}

#[async_trait]
impl TextClassifier for KeywordClassifier {
    async fn classify_text(&self, text: &str) -> Result<SeverityReport> {
        self.score(text)
    }

    fn name(&self) -> &str {
        "keyword-text"
    }
}

#[async_trait]
impl ImageClassifier for KeywordClassifier {
    async fn classify_image(&self, image: &ImageHandle, prompt: &Prompt) -> Result<SeverityReport> {
        let depicted = image.revised_prompt.as_deref().unwrap_or(prompt.text());
        self.score(depicted)
    }

    fn name(&self) -> &str {
        "keyword-image"
    }
}
