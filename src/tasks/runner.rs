//! # Concurrent batch execution with per-slot outcomes.
//!
//! [`run_all`] runs a homogeneous batch of units under a single context and
//! returns an error slot for each unit, in input order. Every slot is
//! populated before return:
//!
//! ```text
//!   run_all(tasks, ctx)
//!        │ one worker per task
//!        ▼
//!   tokio::spawn(task.run) ──► outcome ──► slot[i] = unit result
//!        │                                 (panic ⇒ "internal server error")
//!        └────── ctx.done() wins ────────► slot[i] = "timeout"
//! ```
//!
//! Only two failures are synthesized by the runner itself: `"timeout"` when
//! the context wins the race, and `"internal server error"` when the unit
//! panicked. Everything else is whatever the unit returned. A timed-out
//! unit keeps running detached; its late result is discarded.

use futures::future::join_all;

use crate::context::CallContext;
use crate::error::ServiceError;
use crate::tasks::runnable::RunnableRef;

/// Runs every task concurrently until completion or context done.
///
/// The returned slots are positionally aligned with `tasks`; `None` denotes
/// success. Start and completion order within the batch are unspecified.
pub async fn run_all(tasks: Vec<RunnableRef>, ctx: &CallContext) -> Vec<Option<ServiceError>> {
    let workers = tasks.into_iter().map(|task| {
        let ctx = ctx.clone();
        async move {
            let task_ctx = ctx.clone();
            let handle = tokio::spawn(async move { task.run(task_ctx).await });

            tokio::select! {
                joined = handle => match joined {
                    Ok(Ok(())) => None,
                    Ok(Err(err)) => Some(err),
                    Err(fault) => {
                        eprintln!("[critical] trapped fault in task: {fault}");
                        Some(ServiceError::Internal)
                    }
                },
                _ = ctx.done() => Some(ServiceError::Timeout),
            }
        }
    });

    join_all(workers).await
}

/// True when at least one slot holds a failure; an empty list has none.
pub fn any_error(errs: &[Option<ServiceError>]) -> bool {
    errs.iter().any(|err| err.is_some())
}
