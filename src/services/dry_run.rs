//! # Dry-run wrapper over an arbitrary service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::CallContext;
use crate::error::ServiceError;
use crate::services::service::{Service, ServiceRef};

/// Wraps a service so that only CHECK reaches the target.
///
/// `name` is delegated with a `" (dryRun)"` suffix, `check` and `response`
/// are delegated, `run` and `rollback` succeed without touching the target.
/// Mainly used in staged calls, where a dry run of a later stage's work is
/// wanted while an earlier stage does the real thing.
pub struct DryRunService {
    target: ServiceRef,
}

impl DryRunService {
    pub fn new(target: ServiceRef) -> Self {
        Self { target }
    }
}

/// Wraps `target` in a [`DryRunService`] and returns the shared handle.
pub fn make_dry_run(target: ServiceRef) -> ServiceRef {
    Arc::new(DryRunService::new(target))
}

#[async_trait]
impl Service for DryRunService {
    fn name(&self) -> String {
        format!("{} (dryRun)", self.target.name())
    }

    async fn check(&self, ctx: CallContext) -> Result<(), ServiceError> {
        self.target.check(ctx).await
    }

    async fn run(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn rollback(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        Ok(())
    }

    fn response(&self, err: Option<&ServiceError>) -> Option<Value> {
        self.target.response(err)
    }
}
