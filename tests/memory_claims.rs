//! Memory-claim fan-out scenarios against an in-memory store shared by
//! four datacenters, exercised both through a hand-written service and
//! through the REST adapter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use stagehand::{
    rest_api_as_service, CallContext, CallOpts, Coordinator, Nameable, Observer, Recoverable,
    Responder, RestApi, RestApiAction, Service, ServiceError, ServiceRef, SimpleRestApiService,
    StatusCode,
};

const DATACENTERS: [&str; 4] = ["DC1_BLUE", "DC1_RED", "DC2_BLUE", "DC2_RED"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MemoryClaim {
    #[serde(rename = "name")]
    claim_name: String,
    memory_in_mb: i64,
}

impl MemoryClaim {
    fn new(name: &str, memory_in_mb: i64) -> Self {
        Self {
            claim_name: name.into(),
            memory_in_mb,
        }
    }
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

/// One budget shared across all datacenters, so a fan-out can overcommit.
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

    fn read(&self, name: &str) -> Option<MemoryClaim> {
        self.state.lock().unwrap().claims.get(name).cloned()
    }

    fn available(&self) -> i64 {
        self.state.lock().unwrap().available_mb
    }

    fn len(&self) -> usize {
        self.state.lock().unwrap().claims.len()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().unwrap().claims.keys().cloned().collect();
        names.sort();
        names
    }

    /// Claims are debited before the budget check, so an overcommitted
    /// create leaves its claim behind for compensation to clean up.
    fn create(&self, claim: MemoryClaim) -> Result<Value, ServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.claims.contains_key(&claim.claim_name) {
            return Err(ServiceError::failed("already exists"));
        }
        state.available_mb -= claim.memory_in_mb;
        state.claims.insert(claim.claim_name.clone(), claim);
        if state.available_mb < 0 {
            return Err(ServiceError::failed("not enough memory available"));
        }
        Ok(json!("ok"))
    }

    fn replace(&self, claim: MemoryClaim) -> Result<Value, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let existing = match state.claims.get(&claim.claim_name) {
            Some(existing) => existing.clone(),
            None => return Err(ServiceError::failed("not found")),
        };
        let delta = existing.memory_in_mb - claim.memory_in_mb;
        if state.available_mb + delta < 0 {
            return Err(ServiceError::failed("not enough memory available"));
        }
        state.available_mb += delta;
        state.claims.insert(claim.claim_name.clone(), claim);
        Ok(json!("ok"))
    }

    fn delete(&self, name: &str) -> Result<Value, ServiceError> {
        let mut state = self.state.lock().unwrap();
        match state.claims.remove(name) {
            Some(claim) => {
                state.available_mb += claim.memory_in_mb;
                Ok(json!("ok"))
            }
            None => Err(ServiceError::failed("not found")),
        }
    }
}

/// One datacenter's view of the store, as a CRUD surface. Names are scoped
/// by datacenter on the way in and unscoped on the way out, so payloads
/// round-trip through compensation.
#[derive(Clone)]
struct MemoryClaimApi {
    datacenter: String,
    store: MemoryStore,
}

impl MemoryClaimApi {
    fn new(datacenter: &str, store: &MemoryStore) -> Self {
        Self {
            datacenter: datacenter.into(),
            store: store.clone(),
        }
    }

    fn scoped(&self, name: &str) -> String {
        format!("{}{}", self.datacenter, name)
    }
}

#[async_trait]
impl RestApi for MemoryClaimApi {
    type Payload = MemoryClaim;

    async fn get(&self, _ctx: &CallContext, name: &str) -> Result<MemoryClaim, ServiceError> {
        self.store
            .read(&self.scoped(name))
            .map(|mut claim| {
                claim.claim_name = name.to_string();
                claim
            })
            .ok_or_else(|| ServiceError::failed("not found"))
    }

    async fn post(
        &self,
        _ctx: &CallContext,
        payload: &MemoryClaim,
    ) -> Result<Value, ServiceError> {
        let mut claim = payload.clone();
        claim.claim_name = self.scoped(&claim.claim_name);
        self.store.create(claim)
    }

    async fn put(&self, _ctx: &CallContext, payload: &MemoryClaim) -> Result<Value, ServiceError> {
        let mut claim = payload.clone();
        claim.claim_name = self.scoped(&claim.claim_name);
        self.store.replace(claim)
    }

    async fn delete(&self, _ctx: &CallContext, name: &str) -> Result<Value, ServiceError> {
        self.store.delete(&self.scoped(name))
    }

    async fn list(&self, _ctx: &CallContext) -> Result<Value, ServiceError> {
        Ok(json!(self.store.names()))
    }
}

/// Hand-written creation service, one per datacenter, with its own check.
struct MemoryClaimCreate {
    datacenter: String,
    store: MemoryStore,
    claim: MemoryClaim,
    responder: Responder,
    modified: AtomicBool,
}

impl MemoryClaimCreate {
    fn new(datacenter: &str, store: &MemoryStore, claim: &MemoryClaim) -> Self {
        Self {
            datacenter: datacenter.into(),
            store: store.clone(),
            claim: claim.clone(),
            responder: Responder::new(),
            modified: AtomicBool::new(false),
        }
    }

    fn scoped_name(&self) -> String {
        format!("{}{}", self.datacenter, self.claim.claim_name)
    }
}

#[async_trait]
impl Service for MemoryClaimCreate {
    fn name(&self) -> String {
        format!("MyService Create {}", self.datacenter)
    }

    async fn check(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        if self.store.read(&self.scoped_name()).is_some() {
            return Err(ServiceError::failed("already exists"));
        }
        let available = self.store.available();
        if available - self.claim.memory_in_mb < 0 {
            return Err(ServiceError::failed(format!(
                "not enough memory available: ({}/{})",
                self.claim.memory_in_mb, available
            )));
        }
        Ok(())
    }

    async fn run(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        let mut claim = self.claim.clone();
        claim.claim_name = self.scoped_name();
        let result = self.store.create(claim);
        self.modified.store(true, Ordering::SeqCst);
        self.responder.set_response(json!("ok"));
        result.map(|_| ())
    }

    async fn rollback(&self, _ctx: CallContext) -> Result<(), ServiceError> {
        // Only undo what this service actually wrote.
        if self.modified.load(Ordering::SeqCst) {
            let _ = self.store.delete(&self.scoped_name());
        }
        Ok(())
    }

    fn response(&self, err: Option<&ServiceError>) -> Option<Value> {
        self.responder.response(err)
    }
}

/// Captures what the coordinator reports about rollback passes.
#[derive(Default)]
struct RollbackRecorder {
    passes: Mutex<Vec<(Vec<String>, Vec<Option<ServiceError>>)>>,
}

struct RecordingObserver {
    recorder: Arc<RollbackRecorder>,
}

#[async_trait]
impl Observer for RecordingObserver {
    async fn on_rollback_errors(
        &self,
        _ctx: &CallContext,
        services: &[ServiceRef],
        errs: &[Option<ServiceError>],
    ) {
        let names = services.iter().map(|s| s.name()).collect();
        self.recorder
            .passes
            .lock()
            .unwrap()
            .push((names, errs.to_vec()));
    }
}

fn post_services(store: &MemoryStore, claim: &MemoryClaim) -> Vec<ServiceRef> {
    DATACENTERS
        .iter()
        .map(|dc| {
            rest_api_as_service(
                MemoryClaimApi::new(dc, store),
                RestApiAction::Post,
                format!("MyService Create {dc}"),
                claim.claim_name.clone(),
                Some(claim.clone()),
            )
        })
        .collect()
}

fn create_services(store: &MemoryStore, claim: &MemoryClaim) -> Vec<ServiceRef> {
    DATACENTERS
        .iter()
        .map(|dc| Arc::new(MemoryClaimCreate::new(dc, store, claim)) as ServiceRef)
        .collect()
}

async fn wait_until(mut pred: impl FnMut() -> bool) {
    for _ in 0..200 {
        if pred() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never reached");
}

#[tokio::test]
async fn post_fan_out_succeeds_across_datacenters() {
    let store = MemoryStore::with_budget(2048);
    let claim = MemoryClaim::new("cache", 100);
    let services = post_services(&store, &claim);

    let (status, reply) = Coordinator::default()
        .call_services_and_reply(&CallContext::new(), &services, &CallOpts::default())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply.status, "ok");
    assert_eq!(reply.details.len(), 4);
    for detail in &reply.details {
        assert_eq!(detail.detail, json!("ok"));
    }
    assert_eq!(store.len(), 4);
    assert_eq!(store.available(), 2048 - 4 * 100);
}

#[tokio::test]
async fn repeat_post_conflicts_during_check() {
    let store = MemoryStore::with_budget(2048);
    let claim = MemoryClaim::new("cache", 100);

    let (status, _) = Coordinator::default()
        .call_services_and_reply(
            &CallContext::new(),
            &post_services(&store, &claim),
            &CallOpts::default(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The same fan-out again: every datacenter now conflicts during CHECK,
    // so nothing runs and nothing is compensated.
    let (status, reply) = Coordinator::default()
        .call_services_and_reply(
            &CallContext::new(),
            &post_services(&store, &claim),
            &CallOpts::default(),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.status, "one or more pre-run checks failed");
    assert_eq!(reply.details.len(), 4);
    for detail in &reply.details {
        assert_eq!(
            detail.detail,
            json!("cannot create cache because it already exists")
        );
    }
    assert_eq!(store.len(), 4, "the first fan-out's claims are untouched");
}

#[tokio::test]
async fn repeat_create_service_conflicts_with_already_exists() {
    let store = MemoryStore::with_budget(2048);
    let claim = MemoryClaim::new("cache", 100);

    Coordinator::default()
        .call_services(
            &CallContext::new(),
            &create_services(&store, &claim),
            &CallOpts::default(),
        )
        .await
        .expect("first fan-out succeeds");

    let (status, reply) = Coordinator::default()
        .call_services_and_reply(
            &CallContext::new(),
            &create_services(&store, &claim),
            &CallOpts::default(),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.status, "one or more pre-run checks failed");
    for detail in &reply.details {
        assert_eq!(detail.detail, json!("already exists"));
    }
}

#[tokio::test]
async fn overcommitted_fan_out_rolls_back_everything() {
    let store = MemoryStore::with_budget(2048);
    // Four claims against a budget that fits two: the shared counter lets
    // the first pair through and fails the rest at RUN time.
    let claim = MemoryClaim::new("bulk", 1024);
    let services = post_services(&store, &claim);

    let recorder = Arc::new(RollbackRecorder::default());
    let coordinator = Coordinator::new(RecordingObserver {
        recorder: recorder.clone(),
    });

    let (status, reply) = coordinator
        .call_services_and_reply(&CallContext::new(), &services, &CallOpts::default())
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.status, "one or more runs failed");
    assert_eq!(reply.details.len(), 4);

    let oks = reply
        .details
        .iter()
        .filter(|d| d.detail == json!("ok"))
        .count();
    let shortages = reply
        .details
        .iter()
        .filter(|d| d.detail == json!("not enough memory available"))
        .count();
    assert_eq!((oks, shortages), (2, 2));

    // Compensation deletes every claim, including the overcommitted ones,
    // and restores the budget in full.
    wait_until(|| store.len() == 0 && store.available() == 2048).await;

    wait_until(|| !recorder.passes.lock().unwrap().is_empty()).await;
    let passes = recorder.passes.lock().unwrap();
    assert_eq!(passes.len(), 1);
    let (names, errs) = &passes[0];
    assert_eq!(names.len(), 4);
    assert!(
        errs.iter().all(|e| e.is_none()),
        "rollback itself must be error-free, got {errs:?}"
    );
}

#[tokio::test]
async fn post_rollback_deletes_the_created_claim() {
    let store = MemoryStore::with_budget(2048);
    let claim = MemoryClaim::new("cache", 100);
    let api = MemoryClaimApi::new("DC1_BLUE", &store);
    let service = rest_api_as_service(
        api,
        RestApiAction::Post,
        "create cache",
        "cache",
        Some(claim),
    );

    let ctx = CallContext::new();
    service.check(ctx.clone()).await.expect("nothing exists yet");
    service.run(ctx.clone()).await.expect("create succeeds");
    assert_eq!(store.len(), 1);

    service.rollback(ctx).await.expect("delete succeeds");
    assert_eq!(store.len(), 0);
    assert_eq!(store.available(), 2048);
}

#[tokio::test]
async fn put_rollback_restores_the_checked_backup() {
    let store = MemoryStore::with_budget(2048);
    store
        .create(MemoryClaim::new("DC1_BLUEcache", 100))
        .expect("seed claim");

    let api = MemoryClaimApi::new("DC1_BLUE", &store);
    let service = rest_api_as_service(
        api,
        RestApiAction::Put,
        "resize cache",
        "cache",
        Some(MemoryClaim::new("cache", 300)),
    );

    let ctx = CallContext::new();
    service.check(ctx.clone()).await.expect("claim exists");
    service.run(ctx.clone()).await.expect("resize succeeds");
    assert_eq!(store.read("DC1_BLUEcache").unwrap().memory_in_mb, 300);

    service.rollback(ctx).await.expect("restore succeeds");
    assert_eq!(store.read("DC1_BLUEcache").unwrap().memory_in_mb, 100);
    assert_eq!(store.available(), 2048 - 100);
}

#[tokio::test]
async fn delete_rollback_recreates_the_checked_backup() {
    let store = MemoryStore::with_budget(2048);
    store
        .create(MemoryClaim::new("DC1_BLUEcache", 100))
        .expect("seed claim");

    let api = MemoryClaimApi::new("DC1_BLUE", &store);
    let service = rest_api_as_service::<MemoryClaimApi>(
        api,
        RestApiAction::Delete,
        "drop cache",
        "cache",
        None,
    );

    let ctx = CallContext::new();
    service.check(ctx.clone()).await.expect("claim exists");
    service.run(ctx.clone()).await.expect("delete succeeds");
    assert_eq!(store.len(), 0);

    service.rollback(ctx).await.expect("recreate succeeds");
    assert_eq!(store.read("DC1_BLUEcache").unwrap().memory_in_mb, 100);
    assert_eq!(store.available(), 2048 - 100);
}

#[tokio::test]
async fn missing_object_fails_the_put_check() {
    let store = MemoryStore::with_budget(2048);
    let api = MemoryClaimApi::new("DC1_BLUE", &store);
    let service = rest_api_as_service(
        api,
        RestApiAction::Put,
        "resize cache",
        "cache",
        Some(MemoryClaim::new("cache", 300)),
    );

    let err = service
        .check(CallContext::new())
        .await
        .expect_err("nothing to update");
    assert_eq!(err, ServiceError::failed("not found"));
}

#[tokio::test]
async fn simple_adapter_dispatches_without_check_or_rollback() {
    let store = MemoryStore::with_budget(2048);
    store
        .create(MemoryClaim::new("DC1_BLUEcache", 100))
        .expect("seed claim");

    // The bare dispatch variant: a POST that would conflict in the full
    // adapter's check sails through it, and rollback touches nothing.
    let service: ServiceRef = Arc::new(
        SimpleRestApiService::new(
            MemoryClaimApi::new("DC1_BLUE", &store),
            RestApiAction::Post,
            "create cache",
            "cache",
            Some(MemoryClaim::new("cache", 100)),
        )
        .with_recoverable(Recoverable::with_recovery(|_ctx| async { Ok(()) })),
    );

    let ctx = CallContext::new();
    service.check(ctx.clone()).await.expect("no check is made");
    service
        .recover(ctx.clone())
        .await
        .expect("installed recovery succeeds");

    let err = service.run(ctx.clone()).await.expect_err("store conflicts");
    assert_eq!(err, ServiceError::failed("already exists"));

    service.rollback(ctx).await.expect("rollback is a no-op");
    assert_eq!(store.len(), 1, "nothing was deleted");
}

#[tokio::test]
async fn get_and_list_store_the_api_response() {
    let store = MemoryStore::with_budget(2048);
    store
        .create(MemoryClaim::new("DC1_BLUEcache", 100))
        .expect("seed claim");

    let get = rest_api_as_service::<MemoryClaimApi>(
        MemoryClaimApi::new("DC1_BLUE", &store),
        RestApiAction::Get,
        "read cache",
        "cache",
        None,
    );
    let ctx = CallContext::new();
    get.check(ctx.clone()).await.expect("no check for GET");
    get.run(ctx.clone()).await.expect("read succeeds");
    assert_eq!(
        get.response(None),
        Some(json!({"name": "cache", "memory_in_mb": 100}))
    );

    let list = rest_api_as_service::<MemoryClaimApi>(
        MemoryClaimApi::new("DC1_BLUE", &store),
        RestApiAction::List,
        "list claims",
        "",
        None,
    );
    list.run(ctx.clone()).await.expect("list succeeds");
    assert_eq!(list.response(None), Some(json!(["DC1_BLUEcache"])));

    // GET and LIST have nothing to compensate.
    get.rollback(ctx.clone()).await.expect("no-op");
    list.rollback(ctx).await.expect("no-op");
    assert_eq!(store.len(), 1);
}
