//! # The service trait: one unit of orchestrated work.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::CallContext;
use crate::error::ServiceError;

/// Shared handle to a service object.
///
/// The coordinator borrows services for the duration of each action via
/// cheap `Arc` clones; a background compensation task holds its clones
/// until compensation completes.
pub type ServiceRef = Arc<dyn Service>;

/// # One unit of orchestrated work implementing the full lifecycle.
///
/// Only [`name`](Service::name) and [`run`](Service::run) are mandatory.
/// The remaining capabilities default to the conventional fragments:
/// `check` succeeds, `recover` and `rollback` report that they are not
/// implemented, and `response` returns the error text on failure or `"ok"`
/// on success.
///
/// Services within a batch never interact through the coordinator; any
/// cross-service mutable state must be protected by the implementers.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use stagehand::{CallContext, Service, ServiceError};
///
/// struct CreateUser {
///     username: String,
/// }
///
/// #[async_trait]
/// impl Service for CreateUser {
///     fn name(&self) -> String {
///         format!("create user {}", self.username)
///     }
///
///     async fn run(&self, _ctx: CallContext) -> Result<(), ServiceError> {
///         // call the user directory...
///         Ok(())
///     }
///
///     async fn rollback(&self, _ctx: CallContext) -> Result<(), ServiceError> {
///         // delete the user again...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Stable, human-readable identifier used in logs and replies.
    ///
    /// Not required to be unique, but expected to be.
    fn name(&self) -> String;

    /// Pre-run validation. Defaults to success.
    async fn check(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Remediation after a failed check.
    ///
    /// Only invoked when the caller opted in via
    /// [`CallContext::with_recovery`] and the call is not a dry run.
    async fn recover(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        Err(ServiceError::failed("recovery not possible"))
    }

    /// The unit of work itself.
    async fn run(&self, ctx: CallContext) -> Result<(), ServiceError>;

    /// Compensation for a run that may have taken effect.
    ///
    /// When compensation is triggered it is invoked for every service in
    /// the batch, not only the failing ones; implementations should track
    /// whether they actually changed anything.
    async fn rollback(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        Err(ServiceError::failed("rollback not implemented"))
    }

    /// Detail payload for the aggregated reply.
    ///
    /// `None` is dropped by the aggregator; well-behaved services never
    /// return `None` on error paths.
    fn response(&self, err: Option<&ServiceError>) -> Option<Value> {
        match err {
            Some(err) => Some(Value::String(err.to_string())),
            None => Some(Value::String("ok".into())),
        }
    }
}

/// Returns the quoted names of a batch, for logs.
pub fn service_names(services: &[ServiceRef]) -> Vec<String> {
    services
        .iter()
        .map(|service| format!("\"{}\"", service.name()))
        .collect()
}
