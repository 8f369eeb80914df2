pub mod error;

use std::fmt;
use std::net::Ipv6Addr;

use bon::Builder;
use tracing::warn;
use url::Url;

use self::error::ConfigError;

/// Environment variable read by [`EndpointConfig::from_env`] for the host.
pub const HOST_ENV: &str = "GREETER_HOST";
/// Environment variable read by [`EndpointConfig::from_env`] for the port.
pub const PORT_ENV: &str = "GREETER_PORT";

/// Host and port of a remote Greeter service.
///
/// Both fields start out unset and are filled in by the caller, either through the setters or the
/// builder. Nothing is checked until [`validate`](Self::validate) is called right before a remote
/// call is attempted.
///
/// ```ignore
/// let config = EndpointConfig::builder()
///     .host("localhost")
///     .port(50051)
///     .build();
///
/// let target = config.validate()?;
/// assert_eq!(target.uri(), "http://localhost:50051");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
pub struct EndpointConfig {
    /// Host name or IP address of the remote service.
    #[builder(into)]
    pub host: Option<String>,

    /// Port of the remote service. Kept wide so out of range values can be reported.
    pub port: Option<i64>,
}

impl EndpointConfig {
    /// Construct an empty configuration with neither field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the configuration from [`HOST_ENV`] and [`PORT_ENV`].
    ///
    /// Unset variables leave the matching field unset. A port that is not an integer is logged and
    /// left unset.
    pub fn from_env() -> Self {
        let host = std::env::var(HOST_ENV).ok();
        let port = std::env::var(PORT_ENV)
            .ok()
            .and_then(|raw| match raw.trim().parse::<i64>() {
                Ok(port) => Some(port),
                Err(e) => {
                    warn!(variable = PORT_ENV, value = %raw, error = %e, "Ignoring unparseable port");
                    None
                }
            });

        Self { host, port }
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = Some(host.into());
    }

    pub fn set_port(&mut self, port: i64) {
        self.port = Some(port);
    }

    /// Check that both fields are usable, returning the [`Target`] they describe.
    ///
    /// The host is checked before the port so a configuration missing both reports the host.
    pub fn validate(&self) -> Result<Target, ConfigError> {
        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or(ConfigError::MissingHost)?;

        let port = self.port.ok_or(ConfigError::MissingPort)?;
        let port = u16::try_from(port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or(ConfigError::InvalidPort { port })?;

        let target = Target {
            host: host.to_string(),
            port,
        };

        // The URI is rendered from the raw host, so make sure it parses back as exactly that.
        let parsed = Url::parse(&target.uri()).map_err(|_| ConfigError::InvalidHost {
            host: host.to_string(),
        })?;
        if parsed.host_str().is_none()
            || parsed.path() != "/"
            || parsed.query().is_some()
            || parsed.fragment().is_some()
            || !parsed.username().is_empty()
        {
            return Err(ConfigError::InvalidHost {
                host: host.to_string(),
            });
        }

        Ok(target)
    }
}

/// A validated host and port pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The plaintext `http://` URI used to open a channel to this target.
    pub fn uri(&self) -> String {
        format!("http://{self}")
    }
}

/// Renders as `host:port`, bracketing IPv6 literals.
impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_host_is_reported_first() {
        let config = EndpointConfig::new();

        let err = config.validate().unwrap_err();
        assert_eq!(err, ConfigError::MissingHost);
        assert_eq!(err.field(), "host");
        assert_eq!(err.to_string(), "\"host\" is not defined");
    }

    #[test]
    fn test_blank_host_counts_as_missing() {
        let config = EndpointConfig::builder().host("   ").port(50051).build();
        assert_eq!(config.validate().unwrap_err(), ConfigError::MissingHost);
    }

    #[test]
    fn test_missing_port() {
        let mut config = EndpointConfig::new();
        config.set_host("localhost");

        let err = config.validate().unwrap_err();
        assert_eq!(err, ConfigError::MissingPort);
        assert_eq!(err.field(), "port");
        assert_eq!(err.to_string(), "\"port\" is not defined");
    }

    #[test]
    fn test_port_out_of_range() {
        for port in [0, -1, 65536, i64::MAX] {
            let config = EndpointConfig::builder().host("localhost").port(port).build();
            let err = config.validate().unwrap_err();
            assert_eq!(err, ConfigError::InvalidPort { port });
            assert_eq!(err.field(), "port");
        }
    }

    #[test]
    fn test_port_bounds_are_accepted() {
        for port in [1, 65535] {
            let config = EndpointConfig::builder().host("localhost").port(port).build();
            assert_eq!(config.validate().unwrap().port(), port as u16);
        }
    }

    #[test]
    fn test_invalid_host() {
        for host in ["bad host", "example.com/path", "user@example.com"] {
            let config = EndpointConfig::builder().host(host).port(50051).build();
            let err = config.validate().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidHost { .. }), "{host}: {err:?}");
            assert_eq!(err.field(), "host");
        }
    }

    #[test]
    fn test_target_uri() {
        let mut config = EndpointConfig::new();
        config.set_host("localhost");
        config.set_port(50051);
        assert_eq!(config.validate().unwrap().uri(), "http://localhost:50051");

        config.set_host("127.0.0.1");
        assert_eq!(config.validate().unwrap().uri(), "http://127.0.0.1:50051");

        config.set_host("::1");
        let target = config.validate().unwrap();
        assert_eq!(target.host(), "::1");
        assert_eq!(target.uri(), "http://[::1]:50051");
    }

    #[test]
    fn test_setters_overwrite() {
        let mut config = EndpointConfig::builder().host("a.example").port(1).build();
        config.set_host("b.example");
        config.set_port(2);
        assert_eq!(config.host.as_deref(), Some("b.example"));
        assert_eq!(config.port, Some(2));
    }
}
