//! VoxCanvas Telemetry
//!
//! Audit and metrics for moderation runs.
//!
//! Provides:
//! - A hash-chained audit trail so every policy decision of a session can be
//!   replayed and checked for tampering
//! - Per-session counters for runs, rejections and classifier fallbacks

pub mod audit;
pub mod metrics;

pub use audit::{AuditEvent, AuditKind, AuditTrail, RunId};
pub use metrics::{MetricsCollector, MetricsSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::{AuditEvent, AuditKind, AuditTrail, RunId};
    pub use crate::metrics::{MetricsCollector, MetricsSnapshot};
}
