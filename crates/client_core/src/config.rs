use url::Url;

use crate::{backoff::BackoffPolicy, error::ConfigError};

pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8000/ws";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub backoff: BackoffPolicy,
}

impl ClientConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn from_url(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(websocket_url(endpoint)?))
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

pub fn websocket_url(endpoint: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let trimmed = endpoint.trim();
    let rewritten = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        trimmed.to_string()
    };

    let url = Url::parse(&rewritten).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(invalid(format!("scheme must be ws, wss, http or https, got {other}"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}
