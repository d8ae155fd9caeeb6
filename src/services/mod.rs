//! # The service capability set and its reusable fragments.
//!
//! - [`Service`] the polymorphic unit of orchestrated work.
//! - [`ServiceAction`] the lifecycle phase a batch is driven through.
//! - [`Responder`] / [`Recoverable`] composition fragments for implementers.
//! - [`DryRunService`] a wrapper that lets only CHECK reach its target.

mod action;
mod dry_run;
mod fragments;
mod service;

pub use action::ServiceAction;
pub use dry_run::{make_dry_run, DryRunService};
pub use fragments::{BoxServiceFuture, Recoverable, RecoveryFn, Responder};
pub use service::{service_names, Service, ServiceRef};
