use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use isolation_worker::headers::OPENER_POLICY;
use isolation_worker::{
    ClientRegistry, Fetch, FetchError, IsolationWorker, MemoryClients, ScopeHost, WorkerError,
    WorkerState,
};
use proxy_types::{Body, ClientId, FetchRequest, FetchResponse, VersionTag};
use url::Url;
use version_registry::{MemoryNamespaceStore, NamespaceStore, RegistryError};

struct OkNet;

#[async_trait]
impl Fetch for OkNet {
    async fn fetch(&self, _request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        Ok(FetchResponse::new(200, "OK", HeaderMap::new(), Body::Empty))
    }
}

struct BrokenStore;

#[async_trait]
impl NamespaceStore for BrokenStore {
    async fn contains(&self, _tag: &VersionTag) -> Result<bool, RegistryError> {
        Err(RegistryError::Unavailable("store offline".into()))
    }

    async fn list(&self) -> Result<Vec<VersionTag>, RegistryError> {
        Err(RegistryError::Unavailable("store offline".into()))
    }

    async fn delete(&self, _tag: &VersionTag) -> Result<bool, RegistryError> {
        Err(RegistryError::Unavailable("store offline".into()))
    }
}

fn worker(
    tag: &str,
    store: Arc<dyn NamespaceStore>,
    clients: Arc<dyn ClientRegistry>,
) -> Arc<IsolationWorker> {
    Arc::new(IsolationWorker::new(
        VersionTag::from(tag),
        store,
        clients,
        Arc::new(OkNet),
    ))
}

fn get_request() -> FetchRequest {
    FetchRequest::get(Url::parse("https://game.example/index.html").unwrap())
}

#[tokio::test]
async fn install_purges_a_leftover_namespace_under_its_own_tag() {
    let store = Arc::new(MemoryNamespaceStore::new());
    store.insert(VersionTag::from("v3")).await;

    let worker = worker("v3", store.clone(), Arc::new(MemoryClients::new()));
    worker.install().await.unwrap();

    assert!(!store.contains(&VersionTag::from("v3")).await.unwrap());
    assert_eq!(worker.state().await, WorkerState::Waiting);
}

#[tokio::test]
async fn activate_leaves_only_the_current_tag_and_claims_open_pages() {
    let store = Arc::new(MemoryNamespaceStore::new());
    store.insert(VersionTag::from("v1")).await;
    store.insert(VersionTag::from("v2")).await;
    store.insert(VersionTag::from("v3")).await;

    let clients = Arc::new(MemoryClients::new());
    let page = ClientId::new();
    clients.connect(page);

    let worker = worker("v3", store.clone(), clients.clone());
    let claimed = worker.activate().await.unwrap();

    let tags = store.list().await.unwrap();
    assert_eq!(tags, vec![VersionTag::from("v3")]);
    assert_eq!(claimed, 1);
    assert_eq!(clients.controller_of(page).await, Some(worker.id()));
    assert_eq!(worker.state().await, WorkerState::Active);
}

#[tokio::test]
async fn registry_failure_aborts_install() {
    let worker = worker("v1", Arc::new(BrokenStore), Arc::new(MemoryClients::new()));

    let err = worker.install().await.unwrap_err();
    assert!(matches!(err, WorkerError::Registry { phase: "install", .. }));
    assert_eq!(worker.state().await, WorkerState::Installing);
}

#[tokio::test]
async fn registry_failure_aborts_activation_before_claiming() {
    let clients = Arc::new(MemoryClients::new());
    let page = ClientId::new();
    clients.connect(page);

    let worker = worker("v1", Arc::new(BrokenStore), clients.clone());

    let err = worker.activate().await.unwrap_err();
    assert!(matches!(err, WorkerError::Registry { phase: "activate", .. }));
    assert_eq!(clients.controller_of(page).await, None);
    assert_ne!(worker.state().await, WorkerState::Active);
}

#[tokio::test]
async fn registering_a_newer_generation_retires_the_old_one() {
    let store = Arc::new(MemoryNamespaceStore::new());
    let clients = Arc::new(MemoryClients::new());
    let page = ClientId::new();
    clients.connect(page);

    let host = ScopeHost::new(Arc::new(OkNet));

    let v1 = worker("v1", store.clone(), clients.clone());
    host.register(v1.clone()).await.unwrap();
    assert_eq!(clients.controller_of(page).await, Some(v1.id()));

    store.insert(VersionTag::from("v1")).await;
    let v2 = worker("v2", store.clone(), clients.clone());
    host.register(v2.clone()).await.unwrap();

    assert_eq!(v1.state().await, WorkerState::Redundant);
    assert_eq!(v2.state().await, WorkerState::Active);
    assert_eq!(clients.controller_of(page).await, Some(v2.id()));
    assert_eq!(store.list().await.unwrap(), Vec::<VersionTag>::new());

    let out = host.dispatch(&get_request()).await.unwrap();
    assert!(out.headers.contains_key(&OPENER_POLICY));
}

#[tokio::test]
async fn failed_registration_leaves_the_scope_uncontrolled() {
    let host = ScopeHost::new(Arc::new(OkNet));
    let broken = worker("v1", Arc::new(BrokenStore), Arc::new(MemoryClients::new()));

    assert!(host.register(broken).await.is_err());
    assert!(host.active().await.is_none());

    // Pass-through: responses arrive exactly as the origin sent them.
    let out = host.dispatch(&get_request()).await.unwrap();
    assert_eq!(out.status, 200);
    assert!(out.headers.is_empty());
}
