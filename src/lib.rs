//! # stagehand
//!
//! **Stagehand** is a staged concurrent service orchestration library.
//!
//! Request-handling servers use it to execute a fan-out of related
//! operations (say, creating a resource in several datacenters) with
//! transactional semantics and best-effort compensation: every service in
//! a batch is checked before anything runs, failed runs are compensated in
//! the background, and the caller gets one structured reply with a slot
//! for every service.
//!
//! ## Features
//!
//! | Area             | Description                                                            | Key types / traits                         |
//! |------------------|------------------------------------------------------------------------|--------------------------------------------|
//! | **Services**     | Define units of work with the full lifecycle capability set.           | [`Service`], [`ServiceRef`], [`DryRunService`] |
//! | **Coordination** | Drive batches through CHECK → RUN with rollback-on-failure, in stages. | [`Coordinator`], [`CallOpts`], [`CallContext`] |
//! | **Task runner**  | Concurrent fan-out with one traceable slot per unit.                   | [`Runnable`], [`run_all`], [`any_error`]   |
//! | **REST adapter** | Lift a CRUD surface into the lifecycle, compensation inferred.         | [`RestApi`], [`RestApiService`]            |
//! | **Replies**      | Fold per-service outcomes into one JSON-shaped reply.                  | [`Response`], [`generate_response`]        |
//! | **Observation**  | Hook into action dispatch and rollback outcomes.                       | [`Observer`]                               |
//! | **Errors**       | Typed per-service and phase-level failures with stable wire text.      | [`ServiceError`], [`SummaryError`]         |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogObserver`] _(demo/reference only)_.
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use stagehand::{CallContext, CallOpts, Coordinator, Service, ServiceError, ServiceRef};
//!
//! struct ClaimSlot {
//!     datacenter: String,
//! }
//!
//! #[async_trait]
//! impl Service for ClaimSlot {
//!     fn name(&self) -> String {
//!         format!("claim slot {}", self.datacenter)
//!     }
//!
//!     async fn check(&self, _ctx: CallContext) -> Result<(), ServiceError> {
//!         // verify the slot is free...
//!         Ok(())
//!     }
//!
//!     async fn run(&self, _ctx: CallContext) -> Result<(), ServiceError> {
//!         // claim it...
//!         Ok(())
//!     }
//!
//!     async fn rollback(&self, _ctx: CallContext) -> Result<(), ServiceError> {
//!         // release it again...
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let services: Vec<ServiceRef> = vec![
//!         Arc::new(ClaimSlot { datacenter: "DC1".into() }),
//!         Arc::new(ClaimSlot { datacenter: "DC2".into() }),
//!     ];
//!
//!     let coordinator = Coordinator::default();
//!     let ctx = CallContext::new();
//!     let (status, reply) = coordinator
//!         .call_services_and_reply(&ctx, &services, &CallOpts::default())
//!         .await;
//!
//!     println!("{status}: {}", serde_json::to_string(&reply).unwrap());
//! }
//! ```

mod context;
mod coordinator;
mod error;
mod observer;
mod response;
mod rest;
mod services;
mod tasks;

// ---- Public re-exports ----

pub use context::CallContext;
pub use coordinator::{ActionErrorHook, CallOpts, Coordinator, StageStartHook};
pub use error::{CallFailure, ServiceError, StagedFailure, SummaryError};
pub use observer::{NoopObserver, Observer};
pub use response::{generate_response, generate_staged_response, Response, ResponseDetail};
pub use rest::{
    rest_api_as_service, Nameable, RestApi, RestApiAction, RestApiService, SimpleRestApiService,
};
pub use services::{
    make_dry_run, service_names, BoxServiceFuture, DryRunService, Recoverable, RecoveryFn,
    Responder, Service, ServiceAction, ServiceRef,
};
pub use tasks::{any_error, run_all, Runnable, RunnableRef};

// Replies carry an HTTP status; re-exported so callers need no extra import.
pub use http::StatusCode;

// Optional: a simple built-in logging observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observer::LogObserver;
