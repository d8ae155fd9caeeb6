//! # Lifting a [`RestApi`] into the service lifecycle.
//!
//! [`SimpleRestApiService`] is the bare verb dispatch (no check, no
//! rollback). [`RestApiService`] wraps it and synthesizes CHECK and
//! ROLLBACK from the verb:
//!
//! | verb   | check                           | rollback              |
//! |--------|---------------------------------|-----------------------|
//! | GET    | none                            | none                  |
//! | LIST   | none                            | none                  |
//! | POST   | name must not exist             | delete what was made  |
//! | PUT    | name must exist; keep a backup  | restore the backup    |
//! | DELETE | name must exist; keep a backup  | recreate the backup   |

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::context::CallContext;
use crate::error::ServiceError;
use crate::rest::api::{Nameable, RestApi, RestApiAction};
use crate::services::{Recoverable, Responder, Service, ServiceRef};

/// Converts a CRUD surface to a service without check or rollback.
///
/// Used when callers want the bare verb dispatch; the full
/// [`RestApiService`] infers check and rollback on top of it.
pub struct SimpleRestApiService<A: RestApi> {
    api: A,
    api_name: String,
    action: RestApiAction,
    request_name: String,
    payload: Option<A::Payload>,
    responder: Responder,
    recoverable: Recoverable,
}

impl<A: RestApi> SimpleRestApiService<A> {
    /// Builds the dispatch service.
    ///
    /// `request_name` addresses the object for GET and DELETE (and the
    /// conflict check of POST); `payload` is required for POST and PUT.
    pub fn new(
        api: A,
        action: RestApiAction,
        api_name: impl Into<String>,
        request_name: impl Into<String>,
        payload: Option<A::Payload>,
    ) -> Self {
        Self {
            api,
            api_name: api_name.into(),
            action,
            request_name: request_name.into(),
            payload,
            responder: Responder::new(),
            recoverable: Recoverable::new(),
        }
    }

    /// Installs recovery behavior for the CHECK phase.
    pub fn with_recoverable(mut self, recoverable: Recoverable) -> Self {
        self.recoverable = recoverable;
        self
    }

    fn payload(&self) -> Result<&A::Payload, ServiceError> {
        self.payload.as_ref().ok_or_else(|| {
            ServiceError::failed(format!(
                "no payload provided for {} {}",
                self.action, self.api_name
            ))
        })
    }

    async fn dispatch(&self, ctx: &CallContext) -> Result<Value, ServiceError> {
        match self.action {
            RestApiAction::Get => {
                let found = self.api.get(ctx, &self.request_name).await?;
                serde_json::to_value(found).map_err(|err| ServiceError::failed(err.to_string()))
            }
            RestApiAction::Post => self.api.post(ctx, self.payload()?).await,
            RestApiAction::Put => self.api.put(ctx, self.payload()?).await,
            RestApiAction::Delete => self.api.delete(ctx, &self.request_name).await,
            RestApiAction::List => self.api.list(ctx).await,
        }
    }
}

#[async_trait]
impl<A: RestApi> Service for SimpleRestApiService<A> {
    fn name(&self) -> String {
        self.api_name.clone()
    }

    async fn check(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn recover(&self, ctx: CallContext) -> Result<(), ServiceError> {
        self.recoverable.recover(ctx).await
    }

    async fn run(&self, ctx: CallContext) -> Result<(), ServiceError> {
        let response = self.dispatch(&ctx).await?;
        self.responder.set_response(response);
        Ok(())
    }

    async fn rollback(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        Ok(())
    }

    fn response(&self, err: Option<&ServiceError>) -> Option<Value> {
        self.responder.response(err)
    }
}

/// Converts a CRUD surface to a service with check and rollback inferred
/// from the verb.
///
/// PUT and DELETE capture the current object during CHECK; compensation
/// restores or recreates it from that backup.
pub struct RestApiService<A: RestApi> {
    inner: SimpleRestApiService<A>,
    backup: Mutex<Option<A::Payload>>,
}

impl<A: RestApi> RestApiService<A> {
    pub fn new(
        api: A,
        action: RestApiAction,
        api_name: impl Into<String>,
        request_name: impl Into<String>,
        payload: Option<A::Payload>,
    ) -> Self {
        Self {
            inner: SimpleRestApiService::new(api, action, api_name, request_name, payload),
            backup: Mutex::new(None),
        }
    }

    fn store_backup(&self, payload: A::Payload) {
        if let Ok(mut slot) = self.backup.lock() {
            *slot = Some(payload);
        }
    }

    fn backup(&self) -> Result<A::Payload, ServiceError> {
        self.backup
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .ok_or_else(|| ServiceError::failed("no backup captured during check"))
    }
}

/// Builds the full adapter and returns it as a shared handle.
pub fn rest_api_as_service<A: RestApi>(
    api: A,
    action: RestApiAction,
    api_name: impl Into<String>,
    request_name: impl Into<String>,
    payload: Option<A::Payload>,
) -> ServiceRef {
    Arc::new(RestApiService::new(
        api,
        action,
        api_name,
        request_name,
        payload,
    ))
}

#[async_trait]
impl<A: RestApi> Service for RestApiService<A> {
    fn name(&self) -> String {
        self.inner.name()
    }

    async fn check(&self, ctx: CallContext) -> Result<(), ServiceError> {
        if matches!(
            self.inner.action,
            RestApiAction::Get | RestApiAction::List
        ) {
            return Ok(());
        }

        let existing = self.inner.api.get(&ctx, &self.inner.request_name).await;

        if self.inner.action == RestApiAction::Post {
            return match existing {
                Ok(_) => Err(ServiceError::failed(format!(
                    "cannot create {} because it already exists",
                    self.inner.request_name
                ))),
                Err(_) => Ok(()),
            };
        }

        // PUT and DELETE require the object to exist; it becomes the backup.
        self.store_backup(existing?);
        Ok(())
    }

    async fn recover(&self, ctx: CallContext) -> Result<(), ServiceError> {
        self.inner.recover(ctx).await
    }

    async fn run(&self, ctx: CallContext) -> Result<(), ServiceError> {
        self.inner.run(ctx).await
    }

    async fn rollback(&self, ctx: CallContext) -> Result<(), ServiceError> {
        match self.inner.action {
            RestApiAction::Post => {
                // Creation is undone by deletion.
                let name = self.inner.payload()?.name();
                self.inner.api.delete(&ctx, &name).await?;
                Ok(())
            }
            RestApiAction::Put => {
                // Update again to restore the pre-run object.
                let backup = self.backup()?;
                self.inner.api.put(&ctx, &backup).await?;
                Ok(())
            }
            RestApiAction::Delete => {
                // Deletion is undone by recreating the backup.
                let backup = self.backup()?;
                self.inner.api.post(&ctx, &backup).await?;
                Ok(())
            }
            RestApiAction::Get | RestApiAction::List => Ok(()),
        }
    }

    fn response(&self, err: Option<&ServiceError>) -> Option<Value> {
        self.inner.response(err)
    }
}
