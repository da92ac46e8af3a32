//! Isolation proxy worker.
//!
//! A long-lived interception agent registered against a page origin. It
//! manages a versioned cache-namespace lifecycle, intercepts every fetchable
//! request within its scope, forwards eligible requests to the network, and
//! force-sets the cross-origin isolation headers on every disclosed response
//! before handing it back to the page.

pub mod clients;
pub mod errors;
pub mod fetch;
pub mod headers;
pub mod host;
pub mod worker;

pub use clients::{ClientRegistry, MemoryClients};
pub use errors::{ClientError, FetchError, WorkerError};
pub use fetch::Fetch;
pub use headers::with_isolation_headers;
pub use host::ScopeHost;
pub use worker::{intercept, IsolationWorker, WorkerState};
