use std::time::Duration;

use crate::{network::NetworkSource, render::RenderPolicy};

pub const DEFAULT_API_ROOT: &str = "http://127.0.0.1:8002";
pub const DEFAULT_NETWORK: &str = "strade_clip_Convertito.gpkg";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the routing backend; `/percorsi` is appended.
    pub api_root: String,
    pub timeout: Duration,
    pub network_source: NetworkSource,
    pub render_policy: RenderPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            network_source: NetworkSource::Path(DEFAULT_NETWORK.into()),
            render_policy: RenderPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `PERCORSI_API_ROOT`, `PERCORSI_TIMEOUT_SECS`,
    /// `PERCORSI_NETWORK` and `PERCORSI_RENDER_POLICY`. Unparsable values are
    /// logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = lookup("PERCORSI_API_ROOT") {
            config.api_root = root.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("PERCORSI_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(err) => tracing::warn!("ignoring PERCORSI_TIMEOUT_SECS={raw}: {err}"),
            }
        }
        if let Some(raw) = lookup("PERCORSI_NETWORK") {
            if let Ok(source) = raw.parse() {
                config.network_source = source;
            }
        }
        if let Some(raw) = lookup("PERCORSI_RENDER_POLICY") {
            match raw.parse() {
                Ok(policy) => config.render_policy = policy,
                Err(err) => tracing::warn!("ignoring PERCORSI_RENDER_POLICY: {err}"),
            }
        }
        config
    }

    pub fn route_endpoint(&self) -> String {
        format!("{}/percorsi", self.api_root.trim_end_matches('/'))
    }
}
