//! Runtime configuration.
//!
//! Layered sources: built-in defaults, an optional config file, `COI_PROXY_*`
//! environment variables, then explicit CLI overrides.

use std::net::SocketAddr;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the proxy listens on.
    pub listen: SocketAddr,
    /// Origin the proxy fronts; every inbound request is re-aimed here.
    pub upstream: Url,
    /// Version tag for the worker's cache namespace generation. Opaque;
    /// bumping it forces a full namespace purge and worker replacement.
    pub version_tag: String,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

/// CLI-level overrides, applied after file and environment sources.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub listen: Option<SocketAddr>,
    pub upstream: Option<Url>,
    pub version_tag: Option<String>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("listen", "127.0.0.1:8787")?
            .set_default("version_tag", "coi-v1")?
            .set_default("log_filter", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(Environment::with_prefix("COI_PROXY"))
            .set_override_option("listen", overrides.listen.map(|v| v.to_string()))?
            .set_override_option("upstream", overrides.upstream.map(String::from))?
            .set_override_option("version_tag", overrides.version_tag)?
            .build()?
            .try_deserialize()
    }
}
