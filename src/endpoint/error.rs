//! Error types for endpoint configuration.

/// Indicates that an [`EndpointConfig`](super::EndpointConfig) cannot be used to reach a remote
/// service. Each variant names the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No host has been set, or the host is blank.
    #[error("\"host\" is not defined")]
    MissingHost,

    /// No port has been set.
    #[error("\"port\" is not defined")]
    MissingPort,

    /// The host cannot be used as a URI authority.
    #[error("\"host\" is not a valid host name or address: {host}")]
    InvalidHost { host: String },

    /// The port is outside of the valid network port range.
    #[error("\"port\" must be within 1..=65535, got {port}")]
    InvalidPort { port: i64 },
}

impl ConfigError {
    /// The configuration field this error refers to, either `"host"` or `"port"`.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::MissingHost | ConfigError::InvalidHost { .. } => "host",
            ConfigError::MissingPort | ConfigError::InvalidPort { .. } => "port",
        }
    }
}
