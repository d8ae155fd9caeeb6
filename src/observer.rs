//! # Observation hooks for lifecycle actions and rollback outcomes.
//!
//! The [`Observer`] is the coordinator's runtime configuration for
//! reporting: it is consulted before every action dispatch and, detached
//! from the caller, after every rollback pass. It is fixed at
//! [`Coordinator`](crate::Coordinator) construction; there are no
//! process-global hooks.

use async_trait::async_trait;

use crate::context::CallContext;
use crate::error::ServiceError;
use crate::services::{ServiceAction, ServiceRef};

#[cfg(feature = "logging")]
use crate::services::service_names;

/// Hook into coordinator activity (logging, metrics, incident reporting).
///
/// Both methods default to no-ops.
#[async_trait]
pub trait Observer: Send + Sync + 'static {
    /// Called before a lifecycle action is dispatched to a batch.
    async fn on_action(
        &self,
        _ctx: &CallContext,
        _services: &[ServiceRef],
        _action: ServiceAction,
    ) {
    }

    /// Called after a ROLLBACK pass with the per-service results, from a
    /// task detached from the caller. Rollback failures surface nowhere
    /// else, so this is the place to raise incidents.
    async fn on_rollback_errors(
        &self,
        _ctx: &CallContext,
        _services: &[ServiceRef],
        _errs: &[Option<ServiceError>],
    ) {
    }
}

/// Observer that ignores everything (the default).
pub struct NoopObserver;

#[async_trait]
impl Observer for NoopObserver {}

/// Simple logging observer printing bracketed one-liners.
///
/// Enabled via the `logging` feature. Intended for development and demos;
/// implement a custom [`Observer`] for structured logging or metrics.
///
/// ```text
/// [action] running CHECK for: "create DC1","create DC2"
/// [rollback-failed] service="create DC1" err=not found
/// ```
#[cfg(feature = "logging")]
pub struct LogObserver;

#[cfg(feature = "logging")]
#[async_trait]
impl Observer for LogObserver {
    async fn on_action(&self, _ctx: &CallContext, services: &[ServiceRef], action: ServiceAction) {
        println!(
            "[action] running {action} for: {}",
            service_names(services).join(",")
        );
    }

    async fn on_rollback_errors(
        &self,
        _ctx: &CallContext,
        services: &[ServiceRef],
        errs: &[Option<ServiceError>],
    ) {
        for (service, err) in services.iter().zip(errs) {
            if let Some(err) = err {
                eprintln!("[rollback-failed] service=\"{}\" err={err}", service.name());
            }
        }
    }
}
