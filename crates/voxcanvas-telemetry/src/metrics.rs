//! Per-session moderation metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for one session's pipeline runs
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    total_runs: AtomicU64,
    finalized: AtomicU64,
    policy_blocks: AtomicU64,
    generation_failures: AtomicU64,
    generation_attempts: AtomicU64,
    text_fallbacks: AtomicU64,
    image_fallbacks: AtomicU64,
    total_latency_us: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a run
    pub fn record_run(&self) {
        self.inner.total_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run that produced a gallery entry
    pub fn record_finalized(&self) {
        self.inner.finalized.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run rejected by policy
    pub fn record_policy_block(&self) {
        self.inner.policy_blocks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run rejected because generation failed
    pub fn record_generation_failure(&self) {
        self.inner.generation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record calls made to the image generator
    pub fn record_generation_attempts(&self, attempts: u64) {
        self.inner
            .generation_attempts
            .fetch_add(attempts, Ordering::Relaxed);
    }

    /// Record a text classifier fallback
    pub fn record_text_fallback(&self) {
        self.inner.text_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an image classifier fallback
    pub fn record_image_fallback(&self) {
        self.inner.image_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record end-to-end run latency
    pub fn record_latency(&self, latency_us: u64) {
        self.inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_runs: self.inner.total_runs.load(Ordering::Relaxed),
            finalized: self.inner.finalized.load(Ordering::Relaxed),
            policy_blocks: self.inner.policy_blocks.load(Ordering::Relaxed),
            generation_failures: self.inner.generation_failures.load(Ordering::Relaxed),
            generation_attempts: self.inner.generation_attempts.load(Ordering::Relaxed),
            text_fallbacks: self.inner.text_fallbacks.load(Ordering::Relaxed),
            image_fallbacks: self.inner.image_fallbacks.load(Ordering::Relaxed),
            total_latency_us: self.inner.total_latency_us.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_runs: u64,
    pub finalized: u64,
    pub policy_blocks: u64,
    pub generation_failures: u64,
    pub generation_attempts: u64,
    pub text_fallbacks: u64,
    pub image_fallbacks: u64,
    pub total_latency_us: u64,
}

impl MetricsSnapshot {
    /// Runs that ended in a rejection
    pub fn rejected(&self) -> u64 {
        self.policy_blocks + self.generation_failures
    }

    /// Calculate average latency per run
    pub fn avg_latency_us(&self) -> u64 {
        if self.total_runs == 0 {
            0
        } else {
            self.total_latency_us / self.total_runs
        }
    }

    /// Fraction of runs rejected
    pub fn rejection_rate(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.rejected() as f64 / self.total_runs as f64
        }
    }

    /// Classifier fallbacks per run; both stages count, so this can exceed 1
    pub fn fallback_rate(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            (self.text_fallbacks + self.image_fallbacks) as f64 / self.total_runs as f64
        }
    }
}
