//! # Composition fragments shared by service implementations.
//!
//! Concrete services compose these instead of re-implementing the common
//! capabilities: [`Responder`] stores the response produced during RUN,
//! [`Recoverable`] holds an optional recovery closure.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::context::CallContext;
use crate::error::ServiceError;

/// Boxed future returned by a recovery closure.
pub type BoxServiceFuture = Pin<Box<dyn Future<Output = Result<(), ServiceError>> + Send + 'static>>;

/// Recovery closure stored by [`Recoverable`].
pub type RecoveryFn = Arc<dyn Fn(CallContext) -> BoxServiceFuture + Send + Sync>;

/// Holds the response a service produced during RUN.
///
/// Service methods take `&self`, so the stored value lives behind a mutex;
/// the lock is held only to read or replace it, never across an await.
#[derive(Default)]
pub struct Responder {
    response: Mutex<Option<Value>>,
    null_response_as_default: bool,
}

impl Responder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A responder whose missing response stays absent instead of
    /// defaulting to `"ok"`. Services built on it disappear from the
    /// aggregated reply until they store something.
    pub fn with_null_default() -> Self {
        Self {
            response: Mutex::new(None),
            null_response_as_default: true,
        }
    }

    /// Stores the response returned by the underlying operation.
    pub fn set_response(&self, response: Value) {
        if let Ok(mut slot) = self.response.lock() {
            *slot = Some(response);
        }
    }

    /// The detail payload: the error text on failure, otherwise the stored
    /// response, otherwise `"ok"`.
    pub fn response(&self, err: Option<&ServiceError>) -> Option<Value> {
        if let Some(err) = err {
            return Some(Value::String(err.to_string()));
        }

        let stored = self.response.lock().ok().and_then(|slot| slot.clone());
        match stored {
            Some(value) => Some(value),
            None if !self.null_response_as_default => Some(Value::String("ok".into())),
            None => None,
        }
    }
}

/// Optional recovery behavior, defaulting to a "not possible" failure.
#[derive(Default, Clone)]
pub struct Recoverable {
    recovery: Option<RecoveryFn>,
}

impl Recoverable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a recovery closure, invoked after a failed check when the
    /// caller opted in via [`CallContext::with_recovery`].
    pub fn with_recovery<F, Fut>(recovery: F) -> Self
    where
        F: Fn(CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
    {
        Self {
            recovery: Some(Arc::new(move |ctx| Box::pin(recovery(ctx)))),
        }
    }

    /// Runs the installed recovery, or reports that none is possible.
    pub async fn recover(&self, ctx: CallContext) -> Result<(), ServiceError> {
        match &self.recovery {
            Some(recovery) => recovery(ctx).await,
            None => Err(ServiceError::failed("recovery not possible")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responder_prefers_error_text() {
        let responder = Responder::new();
        responder.set_response(Value::String("stored".into()));

        let err = ServiceError::failed("broken");
        assert_eq!(
            responder.response(Some(&err)),
            Some(Value::String("broken".into()))
        );
        assert_eq!(responder.response(None), Some(Value::String("stored".into())));
    }

    #[test]
    fn responder_defaults_to_ok() {
        assert_eq!(
            Responder::new().response(None),
            Some(Value::String("ok".into()))
        );
        assert_eq!(Responder::with_null_default().response(None), None);
    }

    #[tokio::test]
    async fn recoverable_defaults_to_not_possible() {
        let recoverable = Recoverable::new();
        let err = recoverable.recover(CallContext::new()).await.unwrap_err();
        assert_eq!(err, ServiceError::failed("recovery not possible"));
    }

    #[tokio::test]
    async fn recoverable_runs_installed_closure() {
        let recoverable = Recoverable::with_recovery(|_ctx| async { Ok(()) });
        assert!(recoverable.recover(CallContext::new()).await.is_ok());
    }
}
