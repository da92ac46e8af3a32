//! Error types for the worker surface.

use thiserror::Error;
use version_registry::RegistryError;

/// Failure of the underlying network fetch. Propagated to the page as a
/// normal request failure; the worker adds no retry or fallback layer.
#[derive(Clone, Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
}

/// Failure inside the client (controlled page) registry.
#[derive(Clone, Debug, Error)]
pub enum ClientError {
    #[error("internal error: {0}")]
    Internal(String),
}

/// Lifecycle failure. Aborts the install or activate transition in flight;
/// the worker never reaches `Active` with an unknown cache state.
#[derive(Clone, Debug, Error)]
pub enum WorkerError {
    #[error("namespace registry failed during {phase}: {source}")]
    Registry {
        phase: &'static str,
        #[source]
        source: RegistryError,
    },
    #[error("client registry failed during {phase}: {source}")]
    Clients {
        phase: &'static str,
        #[source]
        source: ClientError,
    },
}

impl WorkerError {
    pub(crate) fn registry(phase: &'static str, source: RegistryError) -> Self {
        Self::Registry { phase, source }
    }

    pub(crate) fn clients(phase: &'static str, source: ClientError) -> Self {
        Self::Clients { phase, source }
    }
}
