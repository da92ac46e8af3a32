//! Registry of pages (clients) under the worker's scope and the worker
//! instance currently controlling each of them.

use async_trait::async_trait;
use dashmap::DashMap;
use proxy_types::{ClientId, WorkerId};

use crate::errors::ClientError;

/// Client bookkeeping consumed by the worker during activation.
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Re-point every in-scope client at `controller`, including clients not
    /// yet controlled by any worker, so already-open pages start receiving
    /// intercepted traffic without a reload. Returns how many clients
    /// changed controller.
    async fn claim(&self, controller: WorkerId) -> Result<usize, ClientError>;

    /// The worker currently controlling `client`, if any.
    async fn controller_of(&self, client: ClientId) -> Option<WorkerId>;
}

/// In-memory client registry.
#[derive(Debug, Default)]
pub struct MemoryClients {
    controllers: DashMap<ClientId, Option<WorkerId>>,
}

impl MemoryClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page entered the scope (tab opened or navigated in).
    pub fn connect(&self, client: ClientId) {
        self.controllers.entry(client).or_insert(None);
    }

    /// A page left the scope.
    pub fn disconnect(&self, client: ClientId) {
        self.controllers.remove(&client);
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[async_trait]
impl ClientRegistry for MemoryClients {
    async fn claim(&self, controller: WorkerId) -> Result<usize, ClientError> {
        let mut claimed = 0;
        for mut entry in self.controllers.iter_mut() {
            if *entry.value() != Some(controller) {
                *entry.value_mut() = Some(controller);
                claimed += 1;
            }
        }
        if claimed > 0 {
            tracing::debug!(claimed, worker = ?controller, "claimed clients");
        }
        Ok(claimed)
    }

    async fn controller_of(&self, client: ClientId) -> Option<WorkerId> {
        self.controllers.get(&client).and_then(|entry| *entry)
    }
}
