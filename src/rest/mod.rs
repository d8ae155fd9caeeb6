//! # Projecting a CRUD surface onto the service lifecycle.
//!
//! A [`RestApi`] exposes the four verbs plus LIST; the adapters lift one
//! verb invocation into a [`Service`](crate::Service), synthesizing CHECK
//! and ROLLBACK from the verb's semantics.

mod adapter;
mod api;

pub use adapter::{rest_api_as_service, RestApiService, SimpleRestApiService};
pub use api::{Nameable, RestApi, RestApiAction};
