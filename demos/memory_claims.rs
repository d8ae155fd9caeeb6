//! Fan out a memory claim across four datacenters with compensation.
//!
//! The store keeps one shared budget, so overcommitting the fan-out makes
//! some datacenters fail at RUN time and triggers background rollback.
//!
//! ```bash
//! cargo run --example memory_claims --features logging
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use stagehand::{
    rest_api_as_service, CallContext, CallOpts, Coordinator, LogObserver, Nameable, RestApi,
    RestApiAction, ServiceError, ServiceRef,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryClaim {
    #[serde(rename = "name")]
    claim_name: String,
    memory_in_mb: i64,
}

impl Nameable for MemoryClaim {
    fn name(&self) -> String {
        self.claim_name.clone()
    }
}

#[derive(Default)]
struct StoreState {
    claims: HashMap<String, MemoryClaim>,
    available_mb: i64,
}

/// One budget for every datacenter, to make overcommit observable.
#[derive(Clone)]
struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    fn with_budget(available_mb: i64) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                claims: HashMap::new(),
                available_mb,
            })),
        }
    }

    fn snapshot(&self) -> (usize, i64) {
        let state = self.state.lock().expect("store lock");
        (state.claims.len(), state.available_mb)
    }
}

#[derive(Clone)]
struct MemoryClaimApi {
    datacenter: String,
    store: MemoryStore,
}

impl MemoryClaimApi {
    fn scoped(&self, name: &str) -> String {
        format!("{}{}", self.datacenter, name)
    }
}

#[async_trait]
impl RestApi for MemoryClaimApi {
    type Payload = MemoryClaim;

    async fn get(&self, _ctx: &CallContext, name: &str) -> Result<MemoryClaim, ServiceError> {
        let state = self.store.state.lock().expect("store lock");
        state
            .claims
            .get(&self.scoped(name))
            .map(|claim| MemoryClaim {
                claim_name: name.to_string(),
                memory_in_mb: claim.memory_in_mb,
            })
            .ok_or_else(|| ServiceError::failed("not found"))
    }

    async fn post(
        &self,
        _ctx: &CallContext,
        payload: &MemoryClaim,
    ) -> Result<Value, ServiceError> {
        let mut state = self.store.state.lock().expect("store lock");
        let scoped = self.scoped(&payload.claim_name);
        if state.claims.contains_key(&scoped) {
            return Err(ServiceError::failed("already exists"));
        }
        state.available_mb -= payload.memory_in_mb;
        state.claims.insert(
            scoped.clone(),
            MemoryClaim {
                claim_name: scoped,
                memory_in_mb: payload.memory_in_mb,
            },
        );
        if state.available_mb < 0 {
            return Err(ServiceError::failed("not enough memory available"));
        }
        Ok(json!("ok"))
    }

    async fn put(&self, _ctx: &CallContext, payload: &MemoryClaim) -> Result<Value, ServiceError> {
        let mut state = self.store.state.lock().expect("store lock");
        let scoped = self.scoped(&payload.claim_name);
        if !state.claims.contains_key(&scoped) {
            return Err(ServiceError::failed("not found"));
        }
        state.claims.insert(
            scoped.clone(),
            MemoryClaim {
                claim_name: scoped,
                memory_in_mb: payload.memory_in_mb,
            },
        );
        Ok(json!("ok"))
    }

    async fn delete(&self, _ctx: &CallContext, name: &str) -> Result<Value, ServiceError> {
        let mut state = self.store.state.lock().expect("store lock");
        match state.claims.remove(&self.scoped(name)) {
            Some(claim) => {
                state.available_mb += claim.memory_in_mb;
                Ok(json!("ok"))
            }
            None => Err(ServiceError::failed("not found")),
        }
    }

    async fn list(&self, _ctx: &CallContext) -> Result<Value, ServiceError> {
        let state = self.store.state.lock().expect("store lock");
        Ok(json!(state.claims.keys().collect::<Vec<_>>()))
    }
}

fn fan_out(store: &MemoryStore, claim: &MemoryClaim) -> Vec<ServiceRef> {
    ["DC1_BLUE", "DC1_RED", "DC2_BLUE", "DC2_RED"]
        .iter()
        .map(|dc| {
            rest_api_as_service(
                MemoryClaimApi {
                    datacenter: (*dc).to_string(),
                    store: store.clone(),
                },
                RestApiAction::Post,
                format!("MyService Create {dc}"),
                claim.claim_name.clone(),
                Some(claim.clone()),
            )
        })
        .collect()
}

#[tokio::main]
async fn main() {
    let store = MemoryStore::with_budget(2048);
    let coordinator = Coordinator::new(LogObserver);
    let ctx = CallContext::new().with_timeout(Duration::from_secs(5));

    // A fan-out that fits the budget.
    let claim = MemoryClaim {
        claim_name: "cache".into(),
        memory_in_mb: 100,
    };
    let (status, reply) = coordinator
        .call_services_and_reply(&ctx, &fan_out(&store, &claim), &CallOpts::default())
        .await;
    println!(
        "create: {status} {}",
        serde_json::to_string_pretty(&reply).expect("reply is serializable")
    );

    // A fan-out that overcommits: some datacenters fail, the background
    // rollback removes what the others created.
    let bulk = MemoryClaim {
        claim_name: "bulk".into(),
        memory_in_mb: 1024,
    };
    let (status, reply) = coordinator
        .call_services_and_reply(&ctx, &fan_out(&store, &bulk), &CallOpts::default())
        .await;
    println!(
        "overcommit: {status} {}",
        serde_json::to_string_pretty(&reply).expect("reply is serializable")
    );

    // Give the detached compensation a moment, then show the store state.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let (claims, available_mb) = store.snapshot();
    println!("store after rollback: {claims} claims left, {available_mb} MB available");
}
