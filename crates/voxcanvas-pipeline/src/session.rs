//! One user session: a pipeline, its gallery and its audit record

use crate::gallery::{Gallery, GalleryListing};
use crate::pipeline::{Pipeline, PipelineInput, RunOutcome};
use crate::recorder::RunRecorder;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use voxcanvas_core::{AudioClip, Error, GalleryView, Prompt, Result};
use voxcanvas_telemetry::{AuditTrail, MetricsSnapshot};

/// Owns everything that lives exactly as long as the user's session.
///
/// Ending the session cancels any in-flight run and discards the gallery.
/// A cancelled run never appends.
pub struct Session {
    pipeline: Pipeline,
    gallery: Gallery,
    recorder: RunRecorder,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            gallery: Gallery::new(),
            recorder: RunRecorder::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Run one input to completion, or until the session ends
    pub async fn run(&self, input: impl Into<PipelineInput>) -> Result<RunOutcome> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => {
                warn!("Session ended while a run was in flight, abandoning it");
                self.recorder.abandoned();
                Err(Error::Cancelled)
            }
            outcome = self.pipeline.run(input.into(), &self.gallery, &self.recorder) => outcome,
        }
    }

    /// Transcribe a clip so the user can review and edit it before running
    pub async fn transcribe(&self, clip: &AudioClip) -> Result<Prompt> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.pipeline.transcribe(clip).await
    }

    /// Current gallery contents, optionally without adult entries
    pub fn list(&self, hide_adult: bool) -> GalleryListing {
        let view = if hide_adult {
            GalleryView::hide_adult()
        } else {
            GalleryView::all()
        };
        self.gallery.list(view)
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.recorder.metrics()
    }

    /// Run `f` against the session's audit trail
    pub fn with_audit<R>(&self, f: impl FnOnce(&AuditTrail) -> R) -> R {
        self.recorder.with_audit(f)
    }

    /// Token that ends the session when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_ended(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// End the session: abandon any in-flight run and discard the gallery
    pub fn end(&self) {
        self.cancel.cancel();
        let entries = self.gallery.close();
        self.recorder.gallery_cleared(entries);
        info!(entries, "Session ended");
    }
}
