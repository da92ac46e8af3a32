//! Cross-origin isolation header rewrite.
//!
//! Modeled as a pure transform of the origin header map so the override
//! behavior is testable as a function of headers alone: the result is the
//! original map with exactly three keys force-set, everything else preserved.

use http::header::{HeaderMap, HeaderName, HeaderValue};

pub const OPENER_POLICY: HeaderName = HeaderName::from_static("cross-origin-opener-policy");
pub const EMBEDDER_POLICY: HeaderName = HeaderName::from_static("cross-origin-embedder-policy");
pub const RESOURCE_POLICY: HeaderName = HeaderName::from_static("cross-origin-resource-policy");

/// Origin headers plus the three forced isolation overrides.
///
/// Pre-existing values under the same keys are replaced, never merged.
pub fn with_isolation_headers(origin: &HeaderMap) -> HeaderMap {
    let mut headers = origin.clone();
    headers.insert(OPENER_POLICY, HeaderValue::from_static("same-origin"));
    headers.insert(EMBEDDER_POLICY, HeaderValue::from_static("require-corp"));
    headers.insert(RESOURCE_POLICY, HeaderValue::from_static("cross-origin"));
    headers
}
