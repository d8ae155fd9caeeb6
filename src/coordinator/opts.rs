//! # Per-call options recognized by the coordinator.

use std::sync::Arc;

use crate::context::CallContext;
use crate::error::ServiceError;
use crate::services::{ServiceAction, ServiceRef};

/// Hook invoked synchronously whenever CHECK or RUN produces any failure,
/// before any recovery or rollback decision. A slow hook adds to the
/// caller's return latency.
pub type ActionErrorHook =
    Arc<dyn Fn(&CallContext, ServiceAction, &[ServiceRef], &[Option<ServiceError>]) + Send + Sync>;

/// Hook invoked immediately before each stage begins its CHECK.
pub type StageStartHook = Arc<dyn Fn(&CallContext, &[ServiceRef]) + Send + Sync>;

/// Options for [`Coordinator::call_services`](crate::Coordinator::call_services)
/// and [`Coordinator::call_staged_services`](crate::Coordinator::call_staged_services).
#[derive(Default, Clone)]
pub struct CallOpts {
    /// Suppresses compensation on RUN failure.
    pub skip_rollback: bool,
    /// Observer for failed CHECK/RUN phases.
    pub on_action_error: Option<ActionErrorHook>,
    /// Observer for stage starts (staged calls only).
    pub on_stage_start: Option<StageStartHook>,
}
