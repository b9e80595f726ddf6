//! Bridges pipeline transitions to the audit trail and metrics

use crate::pipeline::{Rejection, RejectionKind};
use parking_lot::Mutex;
use serde_json::json;
use voxcanvas_classifiers::Assessment;
use voxcanvas_core::{EntryId, RatingCategory};
use voxcanvas_telemetry::{
    AuditEvent, AuditKind, AuditTrail, MetricsCollector, MetricsSnapshot, RunId,
};

/// Audit trail and counters of one session
#[derive(Default)]
pub struct RunRecorder {
    audit: Mutex<AuditTrail>,
    metrics: MetricsCollector,
}

impl RunRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn received(&self, run_id: RunId, prompt: &str, from_audio: bool) {
        self.metrics.record_run();
        self.record(
            AuditEvent::new(AuditKind::RunReceived)
                .for_run(run_id)
                .with_data(json!({ "prompt": prompt, "from_audio": from_audio })),
        );
    }

    pub(crate) fn text_checked(&self, run_id: RunId, assessment: &Assessment) {
        if assessment.is_fallback() {
            self.metrics.record_text_fallback();
        }
        self.record(
            AuditEvent::new(AuditKind::TextChecked)
                .for_run(run_id)
                .with_data(stage_data(assessment)),
        );
    }

    pub(crate) fn generation_failed(&self, run_id: RunId, attempts: u32, error: &str) {
        self.record(
            AuditEvent::new(AuditKind::GenerationFailed)
                .for_run(run_id)
                .with_data(json!({ "attempts": attempts, "error": error })),
        );
    }

    pub(crate) fn generation_attempts(&self, attempts: u32) {
        self.metrics.record_generation_attempts(attempts as u64);
        metrics::counter!("voxcanvas_generation_attempts_total").increment(attempts as u64);
    }

    pub(crate) fn image_checked(&self, run_id: RunId, assessment: &Assessment) {
        if assessment.is_fallback() {
            self.metrics.record_image_fallback();
        }
        self.record(
            AuditEvent::new(AuditKind::ImageChecked)
                .for_run(run_id)
                .with_data(stage_data(assessment)),
        );
    }

    pub(crate) fn finalized(
        &self,
        run_id: RunId,
        id: EntryId,
        rating: RatingCategory,
        latency_us: u64,
    ) {
        self.metrics.record_finalized();
        self.metrics.record_latency(latency_us);
        metrics::counter!("voxcanvas_runs_total", "outcome" => "finalized").increment(1);
        metrics::histogram!("voxcanvas_run_latency_us").record(latency_us as f64);
        self.record(
            AuditEvent::new(AuditKind::RunFinalized)
                .for_run(run_id)
                .with_data(json!({ "entry_id": id, "rating": rating })),
        );
    }

    pub(crate) fn rejected(&self, run_id: RunId, rejection: &Rejection, latency_us: u64) {
        let outcome = match rejection.kind {
            RejectionKind::PolicyBlocked => {
                self.metrics.record_policy_block();
                "policy_blocked"
            }
            RejectionKind::GenerationFailed => {
                self.metrics.record_generation_failure();
                "generation_failed"
            }
        };
        self.metrics.record_latency(latency_us);
        metrics::counter!("voxcanvas_runs_total", "outcome" => outcome).increment(1);
        metrics::histogram!("voxcanvas_run_latency_us").record(latency_us as f64);
        self.record(
            AuditEvent::new(AuditKind::RunRejected)
                .for_run(run_id)
                .with_data(json!({
                    "kind": outcome,
                    "stage": rejection.stage.as_str(),
                    "reasons": rejection.reasons,
                })),
        );
    }

    pub(crate) fn abandoned(&self) {
        metrics::counter!("voxcanvas_runs_total", "outcome" => "abandoned").increment(1);
        self.record(AuditEvent::new(AuditKind::RunAbandoned));
    }

    pub(crate) fn gallery_cleared(&self, entries: usize) {
        self.record(
            AuditEvent::new(AuditKind::GalleryCleared).with_data(json!({ "entries": entries })),
        );
    }

    fn record(&self, event: AuditEvent) {
        self.audit.lock().add_event(event);
    }

    /// Current counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Run `f` against the audit trail
    pub fn with_audit<R>(&self, f: impl FnOnce(&AuditTrail) -> R) -> R {
        f(&self.audit.lock())
    }
}

fn stage_data(assessment: &Assessment) -> serde_json::Value {
    json!({
        "category": assessment.verdict.category,
        "flagged": assessment.verdict.flagged,
        "reasons": assessment.verdict.reasons,
        "confidence": assessment.verdict.confidence(),
        "source": assessment.source.as_str(),
        "latency_us": assessment.latency_us,
    })
}
