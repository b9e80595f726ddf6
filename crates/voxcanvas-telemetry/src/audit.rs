//! Hash-chained moderation audit trail

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Correlates all audit events of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    RunReceived,
    TextChecked,
    GenerationFailed,
    ImageChecked,
    RunFinalized,
    RunRejected,
    RunAbandoned,
    GalleryCleared,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunReceived => "run_received",
            Self::TextChecked => "text_checked",
            Self::GenerationFailed => "generation_failed",
            Self::ImageChecked => "image_checked",
            Self::RunFinalized => "run_finalized",
            Self::RunRejected => "run_rejected",
            Self::RunAbandoned => "run_abandoned",
            Self::GalleryCleared => "gallery_cleared",
        }
    }
}

/// A single audit event in the trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event kind
    pub kind: AuditKind,

    /// Run this event belongs to; session-level events have none
    pub run_id: Option<RunId>,

    /// Event data (JSON serialized)
    pub data: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Hash of this event
    pub hash: Option<String>,

    /// Hash of previous event (for chaining)
    pub previous_hash: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(kind: AuditKind) -> Self {
        Self {
            kind,
            run_id: None,
            data: None,
            timestamp: Utc::now(),
            hash: None,
            previous_hash: None,
        }
    }

    /// Attach the run id
    pub fn for_run(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Set event data
    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_string(&data).ok();
        self
    }
}

/// Append-only audit trail with hash-chained events for tamper detection
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Vec<AuditEvent>,
    chain_hash: Option<String>,
}

impl AuditTrail {
    /// Create a new audit trail
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the audit trail
    pub fn add_event(&mut self, mut event: AuditEvent) {
        event.previous_hash = self.chain_hash.clone();

        let hash = compute_hash(&event);
        event.hash = Some(hash.clone());

        tracing::trace!(kind = event.kind.as_str(), hash = %hash, "Audit event recorded");

        self.chain_hash = Some(hash);
        self.events.push(event);
    }

    /// Index of the first event whose chain link or hash does not verify
    pub fn first_broken(&self) -> Option<usize> {
        let mut prev_hash: Option<&String> = None;

        for (index, event) in self.events.iter().enumerate() {
            if event.previous_hash.as_ref() != prev_hash {
                return Some(index);
            }
            if event.hash.as_ref() != Some(&compute_hash(event)) {
                return Some(index);
            }
            prev_hash = event.hash.as_ref();
        }

        None
    }

    /// Verify the integrity of the audit trail
    pub fn verify(&self) -> bool {
        self.first_broken().is_none()
    }

    /// Get all events
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Events of one run, in order
    pub fn run_events(&self, run_id: RunId) -> impl Iterator<Item = &AuditEvent> {
        self.events
            .iter()
            .filter(move |event| event.run_id == Some(run_id))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Hash the event content (excluding the hash field itself)
fn compute_hash(event: &AuditEvent) -> String {
    let mut hasher = Sha256::new();

    hasher.update(event.kind.as_str().as_bytes());
    if let Some(run_id) = event.run_id {
        hasher.update(run_id.to_string().as_bytes());
    }
    if let Some(ref data) = event.data {
        hasher.update(data.as_bytes());
    }
    hasher.update(
        event
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
            .as_bytes(),
    );
    if let Some(ref prev) = event.previous_hash {
        hasher.update(prev.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}
