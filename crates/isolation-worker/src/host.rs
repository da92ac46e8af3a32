//! Scope host: the runtime surrounding the worker.
//!
//! Owns the currently controlling worker for one registration scope, drives
//! the install/activate sequence when a new generation registers, and
//! delivers fetch events to whichever instance is active. Each lifecycle
//! phase is awaited to completion before the next begins, mirroring how the
//! hosting runtime holds lifecycle events open until their outcome resolves.

use std::sync::Arc;

use proxy_types::{FetchRequest, FetchResponse};
use tokio::sync::RwLock;

use crate::errors::{FetchError, WorkerError};
use crate::fetch::Fetch;
use crate::worker::IsolationWorker;

pub struct ScopeHost {
    net: Arc<dyn Fetch>,
    active: RwLock<Option<Arc<IsolationWorker>>>,
}

impl ScopeHost {
    /// `net` serves uncontrolled traffic: requests arriving while no worker
    /// is active go straight to the network without header rewriting, exactly
    /// as if the worker had never installed.
    pub fn new(net: Arc<dyn Fetch>) -> Self {
        Self {
            net,
            active: RwLock::new(None),
        }
    }

    /// Register a new worker generation for this scope.
    ///
    /// Runs install, retires the previously active instance (the new worker
    /// always skips waiting), then runs activate. Returns the number of
    /// clients the new instance claimed. On failure the scope is left without
    /// a controlling worker and traffic falls back to pass-through.
    pub async fn register(&self, worker: Arc<IsolationWorker>) -> Result<usize, WorkerError> {
        worker.install().await?;

        if let Some(old) = self.active.write().await.take() {
            old.retire().await;
        }

        let claimed = worker.activate().await?;
        *self.active.write().await = Some(worker);
        Ok(claimed)
    }

    pub async fn active(&self) -> Option<Arc<IsolationWorker>> {
        self.active.read().await.clone()
    }

    /// Deliver one fetch event. In-flight dispatches hold a reference to the
    /// instance that received them, so a version swap never preempts them.
    pub async fn dispatch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        match self.active().await {
            Some(worker) => worker.handle_fetch(request).await,
            None => self.net.fetch(request).await,
        }
    }
}
