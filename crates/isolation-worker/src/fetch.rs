//! Network seam for the worker.

use async_trait::async_trait;
use proxy_types::{FetchRequest, FetchResponse};

use crate::errors::FetchError;

/// The network layer the worker forwards eligible requests to.
///
/// Implementations decide opacity: a response whose details cannot be
/// disclosed to the page must come back with status 0 and empty headers
/// (see [`FetchResponse::is_opaque`]). Cancellation and timeouts are owned
/// entirely by the implementation; the worker imposes neither.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}
