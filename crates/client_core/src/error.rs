use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("receive failed: {0}")]
    Receive(String),
    #[error("unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection manager has been torn down")]
    TornDown,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}
