//! # The coordinator: lifecycle state machine over concurrent batches.
//!
//! One batch moves through the lifecycle as a whole:
//!
//! ```text
//!          CHECK
//!          ┌─┴─┐
//!        ok     fail ── recovery opted in AND not dry run?
//!         │              ├─ yes ─► RECOVER ─┬─ all ok ─► proceed
//!         │              │                  └─ any fail ► abort (recovery summary)
//!         │              └─ no ──► abort (pre-run checks summary)
//!         │
//!       dry run? ── yes ─► done (CHECK slots)
//!         │
//!        RUN
//!          ┌─┴─┐
//!        ok     fail ─► ROLLBACK (detached, whole batch, unless skipped)
//!         │             then abort (runs summary)
//!        done
//! ```
//!
//! Strict ordering across phases: RUN begins only after every CHECK slot is
//! populated, ROLLBACK only after every RUN slot. Within a phase the batch
//! runs unordered and in parallel.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;

use crate::context::CallContext;
use crate::coordinator::opts::CallOpts;
use crate::error::{CallFailure, ServiceError, StagedFailure, SummaryError};
use crate::observer::{NoopObserver, Observer};
use crate::response::{generate_response, generate_staged_response, Response};
use crate::services::{ServiceAction, ServiceRef};
use crate::tasks::{any_error, run_all, Runnable, RunnableRef};

/// Bridges one service and one lifecycle action into a runnable unit.
struct ActionTask {
    service: ServiceRef,
    action: ServiceAction,
}

#[async_trait]
impl Runnable for ActionTask {
    async fn run(&self, ctx: CallContext) -> Result<(), ServiceError> {
        match self.action {
            ServiceAction::Check => self.service.check(ctx).await,
            ServiceAction::Recover => self.service.recover(ctx).await,
            ServiceAction::Run => self.service.run(ctx).await,
            ServiceAction::Rollback => self.service.rollback(ctx).await,
        }
    }
}

/// Drives batches of services through the lifecycle.
///
/// Cloning is cheap; clones share the observer. Background compensation
/// holds a clone, so it survives the caller's return.
#[derive(Clone)]
pub struct Coordinator {
    observer: Arc<dyn Observer>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self {
            observer: Arc::new(NoopObserver),
        }
    }
}

impl Coordinator {
    /// Creates a coordinator reporting to the given observer.
    pub fn new(observer: impl Observer) -> Self {
        Self {
            observer: Arc::new(observer),
        }
    }

    /// Runs one lifecycle action across the whole batch.
    ///
    /// Returns one error slot per service, aligned with the input. The
    /// observer is consulted before dispatch; after a ROLLBACK pass it is
    /// additionally informed of the results from a detached task.
    pub async fn run_service_action(
        &self,
        ctx: &CallContext,
        services: &[ServiceRef],
        action: ServiceAction,
    ) -> Vec<Option<ServiceError>> {
        self.observer.on_action(ctx, services, action).await;

        let tasks: Vec<RunnableRef> = services
            .iter()
            .map(|service| {
                Arc::new(ActionTask {
                    service: service.clone(),
                    action,
                }) as RunnableRef
            })
            .collect();
        let errs = run_all(tasks, ctx).await;

        if action == ServiceAction::Rollback {
            let observer = self.observer.clone();
            let ctx = ctx.clone();
            let services = services.to_vec();
            let results = errs.clone();
            tokio::spawn(async move {
                observer.on_rollback_errors(&ctx, &services, &results).await;
            });
        }

        errs
    }

    /// Executes the single-batch lifecycle: CHECK, conditional RECOVER,
    /// RUN, with background compensation on a failed run.
    ///
    /// On success the returned slots are those of the final phase (all
    /// `None`). On failure the [`CallFailure`] carries the failing phase's
    /// slots plus the phase summary; compensation, when triggered, runs
    /// detached and its errors reach only the observer.
    pub async fn call_services(
        &self,
        ctx: &CallContext,
        services: &[ServiceRef],
        opts: &CallOpts,
    ) -> Result<Vec<Option<ServiceError>>, CallFailure> {
        let errs = self
            .run_service_action(ctx, services, ServiceAction::Check)
            .await;
        if any_error(&errs) {
            if let Some(hook) = &opts.on_action_error {
                hook(ctx, ServiceAction::Check, services, &errs);
            }

            if !ctx.dry_run() && ctx.recovery() {
                // Recovery errors are discarded: callers want the root
                // cause, not the compensation failure.
                let recovered = self
                    .run_service_action(ctx, services, ServiceAction::Recover)
                    .await;
                if any_error(&recovered) {
                    return Err(CallFailure {
                        summary: SummaryError::RecoveryFailed,
                        errors: errs,
                    });
                }
            } else {
                return Err(CallFailure {
                    summary: SummaryError::ChecksFailed,
                    errors: errs,
                });
            }
        }

        if ctx.dry_run() {
            return Ok(errs);
        }

        let errs = self
            .run_service_action(ctx, services, ServiceAction::Run)
            .await;
        if any_error(&errs) {
            if let Some(hook) = &opts.on_action_error {
                hook(ctx, ServiceAction::Run, services, &errs);
            }
            if !opts.skip_rollback {
                // Fire-and-forget: the caller returns before compensation
                // starts. The whole batch is compensated, not only the
                // failing services.
                let coordinator = self.clone();
                let ctx = ctx.clone();
                let services = services.to_vec();
                tokio::spawn(async move {
                    coordinator
                        .run_service_action(&ctx, &services, ServiceAction::Rollback)
                        .await;
                });
            }
            return Err(CallFailure {
                summary: SummaryError::RunsFailed,
                errors: errs,
            });
        }

        Ok(errs)
    }

    /// Single-batch lifecycle folded into an HTTP-shaped reply.
    pub async fn call_services_and_reply(
        &self,
        ctx: &CallContext,
        services: &[ServiceRef],
        opts: &CallOpts,
    ) -> (StatusCode, Response) {
        match self.call_services(ctx, services, opts).await {
            Ok(errs) => generate_response(services, &errs, None),
            Err(failure) => generate_response(services, &failure.errors, Some(failure.summary)),
        }
    }

    /// Drives a sequence of stages in index order.
    ///
    /// A stage starts only after every service in the previous stage
    /// completed RUN successfully. On a stage's failure, previously
    /// completed stages are compensated strictly in reverse order from a
    /// detached task; the failing stage itself is already compensated by
    /// [`call_services`](Self::call_services).
    ///
    /// Returns the number of stages that ran to completion.
    pub async fn call_staged_services(
        &self,
        ctx: &CallContext,
        stages: &[Vec<ServiceRef>],
        opts: &CallOpts,
    ) -> Result<usize, StagedFailure> {
        for (index, stage) in stages.iter().enumerate() {
            if let Some(hook) = &opts.on_stage_start {
                hook(ctx, stage);
            }

            if let Err(failure) = self.call_services(ctx, stage, opts).await {
                if !opts.skip_rollback {
                    let coordinator = self.clone();
                    let ctx = ctx.clone();
                    let completed: Vec<Vec<ServiceRef>> = stages[..index].to_vec();
                    tokio::spawn(async move {
                        // Sequential, most recent stage first. Services
                        // within each stage still compensate in parallel.
                        for stage in completed.iter().rev() {
                            coordinator
                                .run_service_action(&ctx, stage, ServiceAction::Rollback)
                                .await;
                        }
                    });
                }
                return Err(StagedFailure {
                    stage: index,
                    summary: failure.summary,
                    errors: failure.errors,
                });
            }
        }

        Ok(stages.len())
    }

    /// Staged lifecycle folded into an HTTP-shaped reply.
    pub async fn call_staged_services_and_reply(
        &self,
        ctx: &CallContext,
        stages: &[Vec<ServiceRef>],
        opts: &CallOpts,
    ) -> (StatusCode, Response) {
        match self.call_staged_services(ctx, stages, opts).await {
            Ok(_) => generate_staged_response(stages, 0, &[], None),
            Err(failure) => generate_staged_response(
                stages,
                failure.stage,
                &failure.errors,
                Some(failure.summary),
            ),
        }
    }
}
