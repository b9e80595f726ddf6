//! The moderation-and-rating pipeline
//!
//! A run moves through
//! `Received → TextChecked → Generated → ImageChecked → Finalized`
//! and may end in `Rejected` at any gate. Only the final append touches
//! shared state; everything before it is a function of the input and the
//! collaborator responses.

use crate::gallery::Gallery;
use crate::recorder::RunRecorder;
use crate::services::{GenerationError, ImageGenerator, Transcriber};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use voxcanvas_classifiers::{ImageRater, TextModerator};
use voxcanvas_core::{AudioClip, Error, GalleryEntry, ImageHandle, Prompt, Result};
use voxcanvas_policy::{RatingPolicy, RetryPolicy};
use voxcanvas_telemetry::RunId;

/// First reason of every generation rejection
pub const GENERATION_FAILED_REASON: &str = "generation failed";

/// Generation calls per run: the first attempt plus one automatic retry
pub const MAX_GENERATION_ATTEMPTS: u32 = 2;

/// Fallback reason for a policy rejection that arrived without one
const POLICY_BLOCKED_REASON: &str = "content blocked by policy";

/// Timeouts and retry budget for collaborator calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Deadline for each text or image classifier call
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,

    /// Deadline for each image generation attempt
    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,

    /// Deadline for transcribing one clip
    #[serde(default = "default_transcription_timeout_ms")]
    pub transcription_timeout_ms: u64,

    /// Retry budget for generation
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl PipelineConfig {
    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn transcription_timeout(&self) -> Duration {
        Duration::from_millis(self.transcription_timeout_ms)
    }

    /// Generation may be retried at most once
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts > MAX_GENERATION_ATTEMPTS {
            return Err(Error::config(format!(
                "retry.max_attempts must be at most {}, got {}",
                MAX_GENERATION_ATTEMPTS, self.retry.max_attempts
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifier_timeout_ms: default_classifier_timeout_ms(),
            generation_timeout_ms: default_generation_timeout_ms(),
            transcription_timeout_ms: default_transcription_timeout_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

fn default_classifier_timeout_ms() -> u64 {
    10_000
}

fn default_generation_timeout_ms() -> u64 {
    60_000
}

fn default_transcription_timeout_ms() -> u64 {
    30_000
}

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    TextChecked,
    Generated,
    ImageChecked,
    Finalized,
    Rejected,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::TextChecked => "text_checked",
            Self::Generated => "generated",
            Self::ImageChecked => "image_checked",
            Self::Finalized => "finalized",
            Self::Rejected => "rejected",
        }
    }
}

/// What a run starts from
#[derive(Debug, Clone)]
pub enum PipelineInput {
    /// Typed or already-transcribed prompt
    Text(Prompt),
    /// Recorded speech, transcribed first
    Audio(AudioClip),
}

impl From<Prompt> for PipelineInput {
    fn from(prompt: Prompt) -> Self {
        Self::Text(prompt)
    }
}

impl From<AudioClip> for PipelineInput {
    fn from(clip: AudioClip) -> Self {
        Self::Audio(clip)
    }
}

/// Why a run was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// A moderation stage found a policy violation; never retried
    PolicyBlocked,
    /// The generator failed after the retry budget was spent
    GenerationFailed,
}

/// Terminal rejection of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub kind: RejectionKind,

    /// State the run was in when the rejecting gate fired
    pub stage: PipelineStage,

    /// Never empty
    pub reasons: Vec<String>,
}

impl Rejection {
    fn new(kind: RejectionKind, stage: PipelineStage, mut reasons: Vec<String>) -> Self {
        if reasons.is_empty() {
            reasons.push(
                match kind {
                    RejectionKind::PolicyBlocked => POLICY_BLOCKED_REASON,
                    RejectionKind::GenerationFailed => GENERATION_FAILED_REASON,
                }
                .to_string(),
            );
        }
        Self {
            kind,
            stage,
            reasons,
        }
    }
}

/// Terminal result of a run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The entry appended to the gallery
    Finalized(Arc<GalleryEntry>),
    Rejected(Rejection),
}

impl RunOutcome {
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized(_))
    }

    pub fn entry(&self) -> Option<&Arc<GalleryEntry>> {
        match self {
            Self::Finalized(entry) => Some(entry),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Finalized(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Per-run bookkeeping
struct RunState<'a> {
    run_id: RunId,
    stage: PipelineStage,
    started: Instant,
    recorder: &'a RunRecorder,
}

impl RunState<'_> {
    fn advance(&mut self, to: PipelineStage) {
        debug!(from = self.stage.as_str(), to = to.as_str(), "Stage transition");
        self.stage = to;
    }

    fn reject(&mut self, kind: RejectionKind, reasons: Vec<String>) -> RunOutcome {
        let rejection = Rejection::new(kind, self.stage, reasons);
        warn!(
            stage = self.stage.as_str(),
            kind = ?kind,
            reasons = ?rejection.reasons,
            "Run rejected"
        );
        self.recorder.rejected(self.run_id, &rejection, self.latency_us());
        self.stage = PipelineStage::Rejected;
        RunOutcome::Rejected(rejection)
    }

    fn latency_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }
}

/// Orchestrates text moderation, generation, image rating and the final
/// rating decision.
///
/// Not reentrant: a second `run` while one is in flight fails with
/// [`Error::RunInProgress`] instead of interleaving gallery appends.
pub struct Pipeline {
    text_moderator: TextModerator,
    image_rater: ImageRater,
    generator: Arc<dyn ImageGenerator>,
    transcriber: Option<Arc<dyn Transcriber>>,
    rating_policy: RatingPolicy,
    config: PipelineConfig,
    run_guard: tokio::sync::Mutex<()>,
}

impl Pipeline {
    /// Create a new pipeline. A retry budget above
    /// [`MAX_GENERATION_ATTEMPTS`] is capped.
    pub fn new(
        text_moderator: TextModerator,
        image_rater: ImageRater,
        generator: Arc<dyn ImageGenerator>,
        mut config: PipelineConfig,
    ) -> Self {
        if config.validate().is_err() {
            warn!(
                requested = config.retry.max_attempts,
                max = MAX_GENERATION_ATTEMPTS,
                "Generation retry budget capped"
            );
            config.retry.max_attempts = MAX_GENERATION_ATTEMPTS;
        }

        Self {
            text_moderator,
            image_rater,
            generator,
            transcriber: None,
            rating_policy: RatingPolicy::new(),
            config,
            run_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Enable audio input
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Turn a clip into a prompt. Failures are returned unchanged as
    /// [`Error::Transcription`].
    pub async fn transcribe(&self, clip: &AudioClip) -> Result<Prompt> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or_else(|| Error::transcription("no transcriber configured"))?;

        if !clip.is_supported_format() {
            return Err(Error::transcription(format!(
                "unsupported audio format: {}",
                clip.format
            )));
        }

        let text = match tokio::time::timeout(
            self.config.transcription_timeout(),
            transcriber.transcribe(clip),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(Error::Transcription(e.message)),
            Err(_) => return Err(Error::transcription("transcription timed out")),
        };

        Prompt::from_transcript(text)
            .map_err(|_| Error::transcription("could not transcribe audio: transcript was empty"))
    }

    /// Run one input to a terminal state, appending to `gallery` on success.
    ///
    /// Policy blocks and generation failures are `Ok(RunOutcome::Rejected)`;
    /// `Err` is reserved for transcription failures and reentrancy.
    pub async fn run(
        &self,
        input: PipelineInput,
        gallery: &Gallery,
        recorder: &RunRecorder,
    ) -> Result<RunOutcome> {
        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| Error::RunInProgress)?;

        let run_id = RunId::generate();
        self.execute(run_id, input, gallery, recorder)
            .instrument(info_span!("pipeline_run", %run_id))
            .await
    }

    async fn execute(
        &self,
        run_id: RunId,
        input: PipelineInput,
        gallery: &Gallery,
        recorder: &RunRecorder,
    ) -> Result<RunOutcome> {
        let started = Instant::now();
        let from_audio = matches!(input, PipelineInput::Audio(_));
        let prompt = match input {
            PipelineInput::Text(prompt) => prompt,
            PipelineInput::Audio(clip) => self.transcribe(&clip).await?,
        };

        recorder.received(run_id, prompt.text(), from_audio);
        let mut state = RunState {
            run_id,
            stage: PipelineStage::Received,
            started,
            recorder,
        };

        // Text gate
        let text = self
            .text_moderator
            .evaluate(&prompt, self.config.classifier_timeout())
            .await;
        recorder.text_checked(run_id, &text);
        if text.verdict.flagged {
            return Ok(state.reject(RejectionKind::PolicyBlocked, text.verdict.reasons));
        }
        state.advance(PipelineStage::TextChecked);

        // Generation
        let image = match self.generate(&prompt, &state).await {
            Ok(image) => image,
            Err(e) => {
                return Ok(state.reject(
                    RejectionKind::GenerationFailed,
                    vec![GENERATION_FAILED_REASON.to_string(), e.to_string()],
                ))
            }
        };
        state.advance(PipelineStage::Generated);

        // Image gate
        let rated = self
            .image_rater
            .evaluate(
                &image,
                &prompt,
                text.verdict.category,
                self.config.classifier_timeout(),
            )
            .await;
        recorder.image_checked(run_id, &rated);
        if rated.verdict.flagged {
            return Ok(state.reject(RejectionKind::PolicyBlocked, rated.verdict.reasons));
        }
        state.advance(PipelineStage::ImageChecked);

        // Final decision, recomputed from both verdicts
        let decision = self.rating_policy.combine(&text.verdict, &rated.verdict);
        if decision.blocked {
            return Ok(state.reject(RejectionKind::PolicyBlocked, decision.warnings));
        }

        // Only shared-state mutation of the run; no await after this point, so
        // a cancelled run either appended and returned or did neither. A
        // gallery closed by a session end refuses the append.
        let entry = GalleryEntry::new(
            prompt,
            image,
            decision.category,
            decision.blocked,
            decision.warnings,
        );
        let (id, stored) = match gallery.insert(entry) {
            Ok(inserted) => inserted,
            Err(Error::Cancelled) => {
                warn!("Gallery closed before the result could be stored");
                recorder.abandoned();
                return Err(Error::Cancelled);
            }
            Err(e) => return Err(e),
        };
        state.advance(PipelineStage::Finalized);
        recorder.finalized(run_id, id, decision.category, state.latency_us());
        info!(%id, rating = %decision.category, "Run finalized");

        Ok(RunOutcome::Finalized(stored))
    }

    async fn generate(
        &self,
        prompt: &Prompt,
        state: &RunState<'_>,
    ) -> std::result::Result<ImageHandle, GenerationError> {
        let text = prompt.generation_text();
        let text: &str = &text;

        let outcome = self
            .config
            .retry
            .execute(|attempt| self.generate_once(text, attempt))
            .await;

        state.recorder.generation_attempts(outcome.attempts);
        if let Err(ref e) = outcome.result {
            state
                .recorder
                .generation_failed(state.run_id, outcome.attempts, &e.to_string());
        }

        outcome.result
    }

    async fn generate_once(
        &self,
        text: &str,
        attempt: u32,
    ) -> std::result::Result<ImageHandle, GenerationError> {
        debug!(attempt, generator = self.generator.name(), "Requesting image");
        let deadline = self.config.generation_timeout();
        match tokio::time::timeout(deadline, self.generator.generate(text)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout),
        }
    }
}
