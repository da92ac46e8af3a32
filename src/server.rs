//! HTTP front door.
//!
//! Every inbound request becomes a fetch event for the scope host: the URL is
//! re-aimed at the configured upstream origin, the declared request mode and
//! cache directive are lifted from the `Sec-Fetch-Mode` and `Cache-Control`
//! headers, and the worker's rewritten response is rendered back to the
//! client.

use std::sync::Arc;

use axum::body::Body as AxumBody;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http::header::{CACHE_CONTROL, CONNECTION, HOST, TRANSFER_ENCODING};
use http::StatusCode;
use isolation_worker::{FetchError, ScopeHost};
use proxy_types::{Body, CacheDirective, FetchRequest, FetchResponse, RequestMode};
use url::Url;

const MAX_REQUEST_BODY: usize = 32 * 1024 * 1024;
const SEC_FETCH_MODE: &str = "sec-fetch-mode";

#[derive(Clone)]
pub struct AppState {
    pub host: Arc<ScopeHost>,
    pub upstream: Url,
}

pub fn router(state: AppState) -> Router {
    Router::new().fallback(proxy_handler).with_state(state)
}

async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let fetch_request = match into_fetch_request(&state.upstream, request).await {
        Ok(req) => req,
        Err(response) => return response,
    };

    match state.host.dispatch(&fetch_request).await {
        Ok(response) => render(response),
        Err(FetchError::Network(message)) => {
            tracing::warn!(%message, "upstream fetch failed");
            (StatusCode::BAD_GATEWAY, message).into_response()
        }
    }
}

async fn into_fetch_request(upstream: &Url, request: Request) -> Result<FetchRequest, Response> {
    let (parts, body) = request.into_parts();

    let mut url = upstream.clone();
    url.set_path(parts.uri.path());
    url.set_query(parts.uri.query());

    let mode = parts
        .headers
        .get(SEC_FETCH_MODE)
        .and_then(|value| value.to_str().ok())
        .and_then(RequestMode::parse)
        .unwrap_or(RequestMode::Navigate);

    let cache = parts
        .headers
        .get(CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            if value.split(',').any(|d| d.trim() == "only-if-cached") {
                CacheDirective::OnlyIfCached
            } else {
                CacheDirective::Default
            }
        })
        .unwrap_or(CacheDirective::Default);

    let bytes = axum::body::to_bytes(body, MAX_REQUEST_BODY)
        .await
        .map_err(|err| (StatusCode::PAYLOAD_TOO_LARGE, err.to_string()).into_response())?;

    let mut headers = parts.headers;
    headers.remove(HOST);

    Ok(FetchRequest {
        method: parts.method,
        url,
        mode,
        cache,
        headers,
        body: Body::from(bytes),
    })
}

fn render(out: FetchResponse) -> Response {
    // Status 0 (opaque / inert placeholder) has no HTTP wire form.
    let status = StatusCode::from_u16(out.status).unwrap_or(StatusCode::NO_CONTENT);

    let mut headers = out.headers;
    headers.remove(CONNECTION);
    headers.remove(TRANSFER_ENCODING);

    let mut response = Response::new(AxumBody::from(out.body.as_bytes()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use http::header::{HeaderMap, HeaderValue};

    use super::*;

    #[test]
    fn render_maps_the_inert_placeholder_to_an_empty_204() {
        let response = render(FetchResponse::empty());
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().is_empty());
    }

    #[test]
    fn render_strips_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/html"),
        );

        let response = render(FetchResponse::new(200, "OK", headers, Body::Empty));

        assert!(response.headers().get(CONNECTION).is_none());
        assert!(response.headers().get(TRANSFER_ENCODING).is_none());
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "text/html"
        );
    }
}
