//! Version-marker registry backing the worker's cache lifecycle.
//!
//! The underlying cache storage is used purely as a set of generation tags:
//! no response bodies are ever written into it. The worker lists and deletes
//! tags during its install/activate phases and touches the registry at no
//! other point.

use std::collections::HashSet;

use async_trait::async_trait;
use proxy_types::VersionTag;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors surfaced by namespace storage.
///
/// A failure during a lifecycle transition aborts that transition; the worker
/// must not proceed with an unknown cache state.
#[derive(Clone, Debug, Error)]
pub enum RegistryError {
    #[error("namespace storage unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Set-of-tags view over the cache storage.
#[async_trait]
pub trait NamespaceStore: Send + Sync {
    /// Whether a namespace with this tag currently exists.
    async fn contains(&self, tag: &VersionTag) -> Result<bool, RegistryError>;

    /// Every tag currently visible to the worker.
    async fn list(&self) -> Result<Vec<VersionTag>, RegistryError>;

    /// Delete the namespace for `tag`. Returns whether one existed.
    async fn delete(&self, tag: &VersionTag) -> Result<bool, RegistryError>;
}

/// In-memory store. Hosts and tests seed it with tags left behind by
/// previous worker generations via [`MemoryNamespaceStore::insert`].
#[derive(Debug, Default)]
pub struct MemoryNamespaceStore {
    tags: RwLock<HashSet<VersionTag>>,
}

impl MemoryNamespaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, tag: VersionTag) {
        self.tags.write().await.insert(tag);
    }

    pub async fn len(&self) -> usize {
        self.tags.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tags.read().await.is_empty()
    }
}

#[async_trait]
impl NamespaceStore for MemoryNamespaceStore {
    async fn contains(&self, tag: &VersionTag) -> Result<bool, RegistryError> {
        Ok(self.tags.read().await.contains(tag))
    }

    async fn list(&self) -> Result<Vec<VersionTag>, RegistryError> {
        Ok(self.tags.read().await.iter().cloned().collect())
    }

    async fn delete(&self, tag: &VersionTag) -> Result<bool, RegistryError> {
        let removed = self.tags.write().await.remove(tag);
        if removed {
            tracing::debug!(tag = %tag, "deleted cache namespace");
        }
        Ok(removed)
    }
}
