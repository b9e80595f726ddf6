//! Mock collaborators shared by the pipeline integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use voxcanvas_classifiers::{
    ImageClassifier, ImageRater, ModerationConfig, SeverityReport, TextClassifier, TextModerator,
};
use voxcanvas_core::{AudioClip, Error, ImageHandle, Prompt, Result};
use voxcanvas_pipeline::{
    GenerationError, ImageGenerator, Pipeline, PipelineConfig, Transcriber, TranscriptionError,
};

/// Classifier returning a fixed report, or failing when built unavailable
pub struct MockClassifier {
    report: Option<SeverityReport>,
    calls: AtomicU32,
}

impl MockClassifier {
    pub fn reporting(report: SeverityReport) -> Arc<Self> {
        Arc::new(Self {
            report: Some(report),
            calls: AtomicU32::new(0),
        })
    }

    pub fn clean() -> Arc<Self> {
        Self::reporting(SeverityReport::new(0.02))
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            report: None,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> Result<SeverityReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.report
            .clone()
            .ok_or_else(|| Error::classifier_unavailable("503 service unavailable"))
    }
}

#[async_trait]
impl TextClassifier for MockClassifier {
    async fn classify_text(&self, _text: &str) -> Result<SeverityReport> {
        self.respond()
    }

    fn name(&self) -> &str {
        "mock-text"
    }
}

#[async_trait]
impl ImageClassifier for MockClassifier {
    async fn classify_image(
        &self,
        _image: &ImageHandle,
        _prompt: &Prompt,
    ) -> Result<SeverityReport> {
        self.respond()
    }

    fn name(&self) -> &str {
        "mock-image"
    }
}

/// Generator that plays back scripted failures, then succeeds
pub struct MockGenerator {
    script: Mutex<VecDeque<GenerationError>>,
    calls: AtomicU32,
    gate: Option<Gate>,
    hang: bool,
}

/// Lets a test hold the generator mid-call
#[derive(Clone, Default)]
pub struct Gate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl MockGenerator {
    pub fn succeeding() -> Arc<Self> {
        Self::failing_with(Vec::new())
    }

    pub fn failing_with(failures: Vec<GenerationError>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(failures.into()),
            calls: AtomicU32::new(0),
            gate: None,
            hang: false,
        })
    }

    pub fn gated(gate: Gate) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
            gate: Some(gate),
            hang: false,
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
            gate: None,
            hang: true,
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> std::result::Result<ImageHandle, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        if self.hang {
            std::future::pending::<()>().await;
        }

        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(err) => Err(err),
            None => Ok(ImageHandle::new(vec![0x89, 0x50, 0x4e, 0x47], "image/png")
                .with_revised_prompt(prompt)),
        }
    }

    fn name(&self) -> &str {
        "mock-generator"
    }
}

/// Transcriber with a fixed answer
pub struct MockTranscriber {
    result: std::result::Result<String, TranscriptionError>,
}

impl MockTranscriber {
    pub fn hearing(text: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(text.to_string()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(TranscriptionError::new(message)),
        })
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _audio: &AudioClip,
    ) -> std::result::Result<String, TranscriptionError> {
        self.result.clone()
    }

    fn name(&self) -> &str {
        "mock-transcriber"
    }
}

pub fn pipeline(
    text: Arc<MockClassifier>,
    image: Arc<MockClassifier>,
    generator: Arc<MockGenerator>,
) -> Pipeline {
    pipeline_with_config(text, image, generator, PipelineConfig::default())
}

pub fn pipeline_with_config(
    text: Arc<MockClassifier>,
    image: Arc<MockClassifier>,
    generator: Arc<MockGenerator>,
    config: PipelineConfig,
) -> Pipeline {
    let moderation = ModerationConfig::default();
    Pipeline::new(
        TextModerator::new(text, &moderation).unwrap(),
        ImageRater::new(image, &moderation).unwrap(),
        generator,
        config,
    )
}

pub fn prompt(text: &str) -> Prompt {
    Prompt::new(text).unwrap()
}

pub fn clip(format: &str) -> AudioClip {
    AudioClip::new(vec![0u8; 64], format)
}
