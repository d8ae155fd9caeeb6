//! # Error types used by the orchestrator and its services.
//!
//! Two enums cover the failure kinds:
//!
//! - [`ServiceError`] per-service failures, carried positionally in slot lists.
//! - [`SummaryError`] coordinator-level failures naming the phase that failed.
//!
//! [`CallFailure`] and [`StagedFailure`] bundle a summary with the aligned
//! per-service slots for the single-batch and staged call surfaces.
//!
//! The `Display` text of both enums is wire-visible (it ends up in reply
//! payloads) and must stay stable.

use thiserror::Error;

/// # Failure of a single service slot.
///
/// `Timeout` and `Internal` are the only failures synthesized by the task
/// runner itself; everything else is whatever the unit returned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The ambient context was done before the unit delivered its outcome.
    /// The unit's late result, if any, is discarded.
    #[error("timeout")]
    Timeout,

    /// The unit panicked; the fault was trapped and converted.
    #[error("internal server error")]
    Internal,

    /// Domain failure returned by a service method.
    #[error("{0}")]
    Failed(String),
}

impl ServiceError {
    /// Builds a domain failure from any displayable reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        ServiceError::Failed(reason.into())
    }

    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Timeout => "service_timeout",
            ServiceError::Internal => "service_internal",
            ServiceError::Failed(_) => "service_failed",
        }
    }
}

/// # Coordinator-level failure describing which lifecycle phase failed.
///
/// Returned separately from the per-service slots: the slots give per-service
/// detail, the summary gives the phase-level diagnosis.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryError {
    /// CHECK produced at least one failure and recovery was not attempted.
    #[error("one or more pre-run checks failed")]
    ChecksFailed,

    /// CHECK failed, RECOVER was attempted, and RECOVER also failed.
    #[error("unable to recover from one or more failed pre-run checks")]
    RecoveryFailed,

    /// RUN produced at least one failure.
    #[error("one or more runs failed")]
    RunsFailed,
}

impl SummaryError {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SummaryError::ChecksFailed => "checks_failed",
            SummaryError::RecoveryFailed => "recovery_failed",
            SummaryError::RunsFailed => "runs_failed",
        }
    }
}

/// Failed outcome of a single-batch call.
///
/// `errors` holds the failing phase's slots, aligned with the input batch;
/// `None` marks the services that succeeded. When the summary is
/// [`SummaryError::RecoveryFailed`], the slots are the original CHECK errors,
/// not the recovery errors.
#[derive(Error, Debug, Clone)]
#[error("{summary}")]
pub struct CallFailure {
    /// Phase-level diagnosis.
    pub summary: SummaryError,
    /// Per-service errors from the failing phase.
    pub errors: Vec<Option<ServiceError>>,
}

/// Failed outcome of a staged call.
#[derive(Error, Debug, Clone)]
#[error("stage {stage}: {summary}")]
pub struct StagedFailure {
    /// Index of the failing stage.
    pub stage: usize,
    /// Phase-level diagnosis of the failing stage.
    pub summary: SummaryError,
    /// Per-service errors from the failing stage's failing phase.
    pub errors: Vec<Option<ServiceError>>,
}
