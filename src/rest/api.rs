//! # The CRUD surface and its operation tags.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::context::CallContext;
use crate::error::ServiceError;

/// An object addressable by a (unique) name.
pub trait Nameable: Send + Sync {
    fn name(&self) -> String;
}

/// # Four-verb CRUD surface plus LIST.
///
/// The payload type is the adapter's currency: `get` returns it (doubling
/// as the compensation backup), `post` and `put` accept it. Responses of
/// the mutating verbs are opaque JSON destined for the aggregated reply.
#[async_trait]
pub trait RestApi: Send + Sync + 'static {
    type Payload: Nameable + Serialize + Clone + Send + Sync + 'static;

    /// Reads one object by name.
    async fn get(&self, ctx: &CallContext, name: &str) -> Result<Self::Payload, ServiceError>;

    /// Creates an object.
    async fn post(&self, ctx: &CallContext, payload: &Self::Payload)
        -> Result<Value, ServiceError>;

    /// Replaces an object.
    async fn put(&self, ctx: &CallContext, payload: &Self::Payload) -> Result<Value, ServiceError>;

    /// Deletes one object by name.
    async fn delete(&self, ctx: &CallContext, name: &str) -> Result<Value, ServiceError>;

    /// Lists all objects.
    async fn list(&self, ctx: &CallContext) -> Result<Value, ServiceError>;
}

/// The CRUD operation an adapted service performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestApiAction {
    Get,
    Post,
    Put,
    Delete,
    /// Not an HTTP standard method.
    List,
}

impl fmt::Display for RestApiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RestApiAction::Get => "GET",
            RestApiAction::Post => "POST",
            RestApiAction::Put => "PUT",
            RestApiAction::Delete => "DELETE",
            RestApiAction::List => "LIST",
        })
    }
}
