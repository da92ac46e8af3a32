//! Worker lifecycle and the intercept operation.

use std::sync::Arc;

use proxy_types::{CacheDirective, FetchRequest, FetchResponse, RequestMode, VersionTag, WorkerId};
use tokio::sync::RwLock;
use version_registry::NamespaceStore;

use crate::clients::ClientRegistry;
use crate::errors::{FetchError, WorkerError};
use crate::fetch::Fetch;
use crate::headers::with_isolation_headers;

/// Lifecycle states of one worker instance.
///
/// `Waiting` is always skipped: the worker requests immediate replacement of
/// any previously active instance of the same scope instead of parking until
/// the old one winds down.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Waiting,
    Activating,
    Active,
    Redundant,
}

/// One generation of the isolation worker.
///
/// The only compiled-in state is the version tag; everything else the worker
/// touches lives behind the registry and network seams, so the intercept path
/// stays side-effect free.
pub struct IsolationWorker {
    id: WorkerId,
    tag: VersionTag,
    namespaces: Arc<dyn NamespaceStore>,
    clients: Arc<dyn ClientRegistry>,
    net: Arc<dyn Fetch>,
    state: RwLock<WorkerState>,
}

impl IsolationWorker {
    pub fn new(
        tag: VersionTag,
        namespaces: Arc<dyn NamespaceStore>,
        clients: Arc<dyn ClientRegistry>,
        net: Arc<dyn Fetch>,
    ) -> Self {
        Self {
            id: WorkerId::new(),
            tag,
            namespaces,
            clients,
            net,
            state: RwLock::new(WorkerState::Parsed),
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn tag(&self) -> &VersionTag {
        &self.tag
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Install phase.
    ///
    /// Purges any namespace left under this worker's own tag by a crashed
    /// prior run, then reports ready to replace the currently active
    /// instance. The caller must await the returned future before advancing
    /// the lifecycle; an error leaves the worker uninstalled.
    pub async fn install(&self) -> Result<(), WorkerError> {
        *self.state.write().await = WorkerState::Installing;
        tracing::info!(tag = %self.tag, "installing isolation worker");

        self.namespaces
            .delete(&self.tag)
            .await
            .map_err(|err| WorkerError::registry("install", err))?;

        // skip-waiting: ready for immediate takeover
        *self.state.write().await = WorkerState::Waiting;
        Ok(())
    }

    /// Activate phase.
    ///
    /// Garbage-collects every namespace left by other worker generations,
    /// then claims all in-scope clients so open pages receive intercepted
    /// traffic without a reload. Returns the number of clients claimed.
    /// An error aborts the transition; the worker never reaches `Active`
    /// with an unknown cache state.
    pub async fn activate(&self) -> Result<usize, WorkerError> {
        *self.state.write().await = WorkerState::Activating;

        let tags = self
            .namespaces
            .list()
            .await
            .map_err(|err| WorkerError::registry("activate", err))?;
        for tag in tags {
            if tag != self.tag {
                self.namespaces
                    .delete(&tag)
                    .await
                    .map_err(|err| WorkerError::registry("activate", err))?;
                tracing::info!(stale = %tag, current = %self.tag, "purged stale cache namespace");
            }
        }

        let claimed = self
            .clients
            .claim(self.id)
            .await
            .map_err(|err| WorkerError::clients("activate", err))?;

        *self.state.write().await = WorkerState::Active;
        tracing::info!(tag = %self.tag, claimed, "isolation worker active");
        Ok(claimed)
    }

    /// Replaced by a newer generation; takes no further requests.
    pub async fn retire(&self) {
        *self.state.write().await = WorkerState::Redundant;
        tracing::info!(tag = %self.tag, "isolation worker retired");
    }

    /// One fetch event. Runs independently of other in-flight requests and
    /// mutates nothing.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        intercept(self.net.as_ref(), request).await
    }
}

/// Intercept a single request and deliver the rewritten response.
///
/// The `only-if-cached` directive combined with a non-same-origin mode is
/// illegal at the browser API layer; it is answered with an inert empty
/// response instead of letting the network layer raise a fault. Opaque
/// responses pass through untouched since their headers cannot legally be
/// inspected or rewritten. Network failures propagate unchanged.
pub async fn intercept<F>(net: &F, request: &FetchRequest) -> Result<FetchResponse, FetchError>
where
    F: Fetch + ?Sized,
{
    if request.cache == CacheDirective::OnlyIfCached && request.mode != RequestMode::SameOrigin {
        return Ok(FetchResponse::empty());
    }

    let response = net.fetch(request).await?;
    if response.is_opaque() {
        return Ok(response);
    }

    let rewritten = with_isolation_headers(&response.headers);
    Ok(response.with_headers(rewritten))
}
