//! reqwest-backed network layer for the worker.

use async_trait::async_trait;
use isolation_worker::{Fetch, FetchError};
use proxy_types::{Body, FetchRequest, FetchResponse, RequestMode};
use url::{Origin, Url};

/// Real network fetch.
///
/// Also enforces the browser's opacity rule at the seam the worker expects:
/// a `no-cors` request that crosses the scope origin comes back with its
/// status and headers withheld, so the worker passes it through untouched.
pub struct ReqwestFetch {
    client: reqwest::Client,
    scope_origin: Origin,
}

impl ReqwestFetch {
    pub fn new(scope: &Url) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .tcp_keepalive(Some(std::time::Duration::from_secs(30)))
            .connect_timeout(std::time::Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|err| FetchError::Network(format!("failed to build client: {err}")))?;
        Ok(Self::with_client(client, scope))
    }

    pub fn with_client(client: reqwest::Client, scope: &Url) -> Self {
        Self {
            client,
            scope_origin: scope.origin(),
        }
    }
}

#[async_trait]
impl Fetch for ReqwestFetch {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        match &request.body {
            Body::Empty => {}
            Body::Bytes(bytes) => {
                builder = builder.body(bytes.clone());
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;

        if request.mode == RequestMode::NoCors && request.url.origin() != self.scope_origin {
            return Ok(FetchResponse::opaque());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Network(format!("response body error: {err}")))?;

        Ok(FetchResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            headers,
            Body::from(body),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_origin_comparison_is_scheme_host_port() {
        let fetch = ReqwestFetch::new(&Url::parse("https://game.example").unwrap()).unwrap();
        let same = Url::parse("https://game.example/assets/app.wasm").unwrap();
        let other = Url::parse("https://cdn.example/lib.js").unwrap();

        assert_eq!(same.origin(), fetch.scope_origin);
        assert_ne!(other.origin(), fetch.scope_origin);
    }
}
