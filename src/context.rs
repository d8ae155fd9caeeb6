//! # Ambient call context: cancellation, deadline, and call modes.
//!
//! [`CallContext`] is the single carrier threaded through an entire
//! orchestration call. It wraps a [`CancellationToken`] with an optional
//! absolute deadline and the two call modes:
//!
//! - `dry_run`: only CHECK is executed; RUN and ROLLBACK never happen.
//! - `recovery`: on a failed CHECK, RECOVER is invoked before surfacing
//!   the failure.
//!
//! `dry_run` dominates `recovery`.
//!
//! Background compensation tasks receive a clone of the same context; when
//! the caller's context is already done by the time compensation starts,
//! every compensation slot observes a timeout uniformly.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation carrier for one orchestration call.
///
/// Cloning is cheap; clones share the cancellation token.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use stagehand::CallContext;
///
/// let ctx = CallContext::new()
///     .with_timeout(Duration::from_millis(100))
///     .with_dry_run();
///
/// assert!(ctx.dry_run());
/// assert!(!ctx.recovery());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    dry_run: bool,
    recovery: bool,
}

impl CallContext {
    /// Creates a context with no deadline and both modes off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an absolute deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Marks the call as a dry run: only CHECK reaches the services.
    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Opts in to RECOVER after a failed CHECK.
    pub fn with_recovery(mut self) -> Self {
        self.recovery = true;
        self
    }

    /// Whether the call is a dry run.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Whether the caller opted in to recovery.
    pub fn recovery(&self) -> bool {
        self.recovery
    }

    /// Cancels the context; every pending [`done`](Self::done) completes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Completes when the context is cancelled or its deadline passes.
    ///
    /// With no deadline set and no cancellation, the future never completes;
    /// it is meant to lose a `select!` against actual work.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {}
            },
            None => self.cancel.cancelled().await,
        }
    }

    /// Derives a child context: cancelling the parent cancels the child,
    /// not the other way around. Deadline and modes are inherited.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
            dry_run: self.dry_run,
            recovery: self.recovery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_default_off() {
        let ctx = CallContext::new();
        assert!(!ctx.dry_run());
        assert!(!ctx.recovery());
        assert!(!ctx.is_done());
    }

    #[tokio::test]
    async fn cancel_completes_done() {
        let ctx = CallContext::new();
        ctx.cancel();
        assert!(ctx.is_done());
        ctx.done().await;
    }

    #[tokio::test]
    async fn deadline_completes_done() {
        tokio::time::pause();
        let ctx = CallContext::new().with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_done());
        ctx.done().await;
        assert!(ctx.is_done());
    }

    #[tokio::test]
    async fn child_follows_parent_cancellation() {
        let parent = CallContext::new().with_dry_run();
        let child = parent.child();
        assert!(child.dry_run());

        parent.cancel();
        assert!(child.is_done());
    }
}
