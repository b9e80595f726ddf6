//! VoxCanvas Policy
//!
//! Deterministic decision rules applied between pipeline stages:
//! - [`RatingPolicy`] folds the text and image verdicts into one rating and a
//!   blocked flag
//! - [`RetryPolicy`] bounds how often a transient collaborator failure is
//!   retried before it is surfaced

pub mod rating;
pub mod retry;

pub use rating::{RatingDecision, RatingPolicy};
pub use retry::{Backoff, RetryOutcome, RetryPolicy, Retryable};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::rating::{RatingDecision, RatingPolicy};
    pub use crate::retry::{Backoff, RetryPolicy, Retryable};
}
