//! # Runnable: the unit accepted by the task runner.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::CallContext;
use crate::error::ServiceError;

/// Shared handle to a runnable unit.
pub type RunnableRef = Arc<dyn Runnable>;

/// # Asynchronous unit of work executed by [`run_all`](crate::run_all).
///
/// A unit only takes the ambient [`CallContext`] as an argument; any other
/// parameters should be kept inside the implementing struct. Units may
/// suspend arbitrarily; the runner bounds them by racing the context.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use stagehand::{CallContext, Runnable, ServiceError};
///
/// struct Probe;
///
/// #[async_trait]
/// impl Runnable for Probe {
///     async fn run(&self, _ctx: CallContext) -> Result<(), ServiceError> {
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Runnable: Send + Sync + 'static {
    /// Executes the unit until completion.
    async fn run(&self, ctx: CallContext) -> Result<(), ServiceError>;
}
