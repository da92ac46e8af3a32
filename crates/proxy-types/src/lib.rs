//! Shared primitives for the isolation proxy: the request/response model the
//! worker intercepts, plus the identifiers used by the version registry and
//! the client (controlled page) registry.

use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Opaque label identifying one generation of the worker's cache bookkeeping.
///
/// Tags are compared for equality only; they carry no ordering or semantic
/// versioning meaning. Bumping the tag is the supported way to force a full
/// namespace purge and replacement of a previously active worker.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct VersionTag(pub String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionTag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier for a page under the worker's scope.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier for one worker instance (one generation, one lifecycle run).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub Uuid);

impl WorkerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Request mode as declared by the page that issued the request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

impl RequestMode {
    /// Parse the wire form (e.g. the `Sec-Fetch-Mode` header value).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "navigate" => Some(Self::Navigate),
            "same-origin" => Some(Self::SameOrigin),
            "cors" => Some(Self::Cors),
            "no-cors" => Some(Self::NoCors),
            _ => None,
        }
    }
}

/// Cache directive attached to a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheDirective {
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

impl CacheDirective {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "no-store" => Some(Self::NoStore),
            "reload" => Some(Self::Reload),
            "no-cache" => Some(Self::NoCache),
            "force-cache" => Some(Self::ForceCache),
            "only-if-cached" => Some(Self::OnlyIfCached),
            _ => None,
        }
    }
}

/// Response payload. Bodies pass through the worker unchanged; the proxy
/// never buffers more than the network layer already produced.
#[derive(Clone, Debug, Default)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Bytes),
}

impl Body {
    pub fn as_bytes(&self) -> Bytes {
        match self {
            Body::Empty => Bytes::new(),
            Body::Bytes(b) => b.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Bytes(b) => b.is_empty(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        if value.is_empty() {
            Body::Empty
        } else {
            Body::Bytes(value)
        }
    }
}

/// Immutable description of an outgoing network call as seen by the worker.
///
/// Owned by the issuing page; the worker borrows it for the duration of the
/// interception and never persists it.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub cache: CacheDirective,
    pub headers: HeaderMap,
    pub body: Body,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            mode: RequestMode::SameOrigin,
            cache: CacheDirective::Default,
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cache(mut self, cache: CacheDirective) -> Self {
        self.cache = cache;
        self
    }
}

/// A response flowing back through the worker.
///
/// `status` is the raw wire status; `0` marks a synthetic or opaque response
/// whose details the network layer withheld. Such responses must never have
/// their headers inspected or rewritten.
#[derive(Clone, Debug)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Body,
}

impl FetchResponse {
    pub fn new(status: u16, status_text: impl Into<String>, headers: HeaderMap, body: Body) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers,
            body,
        }
    }

    /// The inert placeholder returned for the illegal request shape: no body,
    /// zero status, no headers.
    pub fn empty() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    /// An opaque response: details withheld by the network layer.
    pub fn opaque() -> Self {
        Self::empty()
    }

    pub fn is_opaque(&self) -> bool {
        self.status == 0
    }

    /// Same status, status text and body, different header map.
    pub fn with_headers(self, headers: HeaderMap) -> Self {
        Self { headers, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tags_compare_by_value() {
        assert_eq!(VersionTag::from("v3"), VersionTag::new("v3"));
        assert_ne!(VersionTag::from("v3"), VersionTag::from("v2"));
    }

    #[test]
    fn request_mode_parses_wire_values() {
        assert_eq!(RequestMode::parse("cors"), Some(RequestMode::Cors));
        assert_eq!(RequestMode::parse("no-cors"), Some(RequestMode::NoCors));
        assert_eq!(
            RequestMode::parse("same-origin"),
            Some(RequestMode::SameOrigin)
        );
        assert_eq!(RequestMode::parse("bogus"), None);
    }

    #[test]
    fn cache_directive_parses_wire_values() {
        assert_eq!(
            CacheDirective::parse("only-if-cached"),
            Some(CacheDirective::OnlyIfCached)
        );
        assert_eq!(CacheDirective::parse(""), None);
    }

    #[test]
    fn empty_response_is_opaque_with_no_headers() {
        let resp = FetchResponse::empty();
        assert!(resp.is_opaque());
        assert!(resp.headers.is_empty());
        assert!(resp.body.is_empty());
        assert_eq!(resp.status_text, "");
    }

    #[test]
    fn body_from_bytes_collapses_empty() {
        assert!(matches!(Body::from(Bytes::new()), Body::Empty));
        assert!(matches!(
            Body::from(Bytes::from_static(b"hi")),
            Body::Bytes(_)
        ));
    }
}
