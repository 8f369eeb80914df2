pub mod error;

use tokio::sync::Mutex;
use tonic::transport::Channel;
use tracing::{debug, warn};

use crate::endpoint::{EndpointConfig, Target};
use crate::grpc::GreeterClient;
use crate::greeter_proto::{HelloRequest, HelloResponse};
use crate::session::{ChannelSession, SessionState};

use self::error::{GreetError, RpcError};

/// Greeting returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetResponse {
    pub greetings: String,
}

impl From<HelloResponse> for GreetResponse {
    fn from(response: HelloResponse) -> Self {
        Self {
            greetings: response.greetings,
        }
    }
}

/// How the invoker obtains a channel for each call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Keep one [`ChannelSession`] and reuse its connection across calls.
    #[default]
    Reuse,
    /// Open a new connection for every call and close it once the call completes.
    PerCall,
}

/// Issues unary `Greeter/Greet` calls.
///
/// The endpoint is passed to every call rather than stored, so callers that change host or port
/// between calls never race an in-flight call. In [`ConnectionMode::Reuse`] a change of endpoint
/// replaces the session's connection.
#[derive(Debug)]
pub struct GreetInvoker {
    session: Mutex<ChannelSession>,
    mode: ConnectionMode,
}

impl GreetInvoker {
    pub fn new(mode: ConnectionMode) -> Self {
        Self {
            session: Mutex::new(ChannelSession::new()),
            mode,
        }
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// Lifecycle state of the reused session. Always unconnected in [`ConnectionMode::PerCall`]
    /// until the invoker is closed.
    pub async fn session_state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    /// Send `name` to the Greeter service described by `config` and wait for the greeting.
    ///
    /// # Errors
    ///
    /// * [`GreetError::Config`] if `config` is missing or has an invalid host or port. This is
    ///   checked before any connection is attempted.
    /// * [`GreetError::Rpc`] for every other failure.
    pub async fn greet(
        &self,
        config: &EndpointConfig,
        name: impl Into<String>,
    ) -> Result<GreetResponse, GreetError> {
        let target = config.validate().inspect_err(|e| {
            warn!(field = e.field(), error = %e, "Rejecting greet, endpoint not configured");
        })?;
        let name = name.into();

        let result = match self.mode {
            ConnectionMode::Reuse => {
                let channel = self.reused_channel(&target).await?;
                call(channel, name).await
            }
            ConnectionMode::PerCall => {
                let mut session = ChannelSession::new();
                let channel = session
                    .ensure_connected(&target)
                    .await
                    .map_err(|e| rpc_failure(&target, e))?;
                let result = call(channel, name).await;
                session.close();
                result
            }
        };

        result
            .map_err(|e| rpc_failure(&target, e))
            .map_err(GreetError::from)
    }

    /// Close the reused session. Later calls in [`ConnectionMode::Reuse`] fail.
    pub async fn close(&self) {
        self.session.lock().await.close();
    }

    async fn reused_channel(&self, target: &Target) -> Result<Channel, RpcError> {
        self.session
            .lock()
            .await
            .ensure_connected(target)
            .await
            .map_err(|e| rpc_failure(target, e))
    }
}

impl Default for GreetInvoker {
    fn default() -> Self {
        Self::new(ConnectionMode::default())
    }
}

async fn call(channel: Channel, name: String) -> Result<GreetResponse, tonic::Status> {
    debug!(name = %name, "Calling Greeter/Greet");

    let mut client = GreeterClient::new(channel);
    let response = client.greet(HelloRequest { name }).await?;

    Ok(response.into_inner().into())
}

fn rpc_failure<E>(target: &Target, cause: E) -> RpcError
where
    E: std::error::Error + Send + Sync + 'static,
{
    warn!(endpoint = %target, error = %cause, "Remote procedure \"greet\" failed");
    RpcError::new(cause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::error::ConfigError;
    use crate::grpc::testing::{config_for, spawn_greeter, unreachable_addr};

    #[tokio::test]
    async fn test_missing_host_is_config_error() {
        let invoker = GreetInvoker::default();
        let config = EndpointConfig::builder().port(50051).build();

        let err = invoker.greet(&config, "Ada").await.unwrap_err();
        assert!(matches!(err, GreetError::Config(ConfigError::MissingHost)));
        assert_eq!(invoker.session_state().await, SessionState::Unconnected);
    }

    #[tokio::test]
    async fn test_missing_port_is_config_error() {
        let invoker = GreetInvoker::default();
        let config = EndpointConfig::builder().host("localhost").build();

        let err = invoker.greet(&config, "Ada").await.unwrap_err();
        match err {
            GreetError::Config(e) => assert_eq!(e.field(), "port"),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_closed_invoker_reports_rpc_error() {
        let invoker = GreetInvoker::default();
        invoker.close().await;

        let config = EndpointConfig::builder().host("127.0.0.1").port(50051).build();
        let err = invoker.greet(&config, "Ada").await.unwrap_err();

        match err {
            GreetError::Rpc(e) => {
                assert_eq!(e.label(), "Error");
                assert_eq!(e.to_string(), "Unable to call remote procedure \"greet\"");
                assert!(std::error::Error::source(&e).is_some());
            }
            other => panic!("expected rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_config_error_performs_no_call() {
        let (addr, service) = spawn_greeter().await;
        let mut config = config_for(addr);
        config.host = None;

        let invoker = GreetInvoker::default();
        assert!(invoker.greet(&config, "Ada").await.is_err());
        assert_eq!(service.served(), 0);
    }

    #[tokio::test]
    async fn test_greet_returns_greeting() {
        let (addr, service) = spawn_greeter().await;
        let invoker = GreetInvoker::default();

        let response = invoker.greet(&config_for(addr), "Ada").await.unwrap();
        assert_eq!(response.greetings, "Hello, Ada");
        assert_eq!(service.served(), 1);
        assert_eq!(invoker.session_state().await, SessionState::Connected);
    }

    #[tokio::test]
    async fn test_successive_names_are_independent() {
        let (addr, _service) = spawn_greeter().await;
        let config = config_for(addr);
        let invoker = GreetInvoker::default();

        let ada = invoker.greet(&config, "Ada").await.unwrap();
        let grace = invoker.greet(&config, "Grace").await.unwrap();
        assert_eq!(ada.greetings, "Hello, Ada");
        assert_eq!(grace.greetings, "Hello, Grace");
    }

    #[tokio::test]
    async fn test_repeated_greets_are_identical() {
        let (addr, service) = spawn_greeter().await;
        let config = config_for(addr);
        let invoker = GreetInvoker::default();

        let first = invoker.greet(&config, "Ada").await.unwrap();
        let second = invoker.greet(&config, "Ada").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.served(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_opaque_rpc_error() {
        let config = config_for(unreachable_addr().await);

        for mode in [ConnectionMode::Reuse, ConnectionMode::PerCall] {
            let invoker = GreetInvoker::new(mode);
            let err = invoker.greet(&config, "Ada").await.unwrap_err();

            match err {
                GreetError::Rpc(e) => {
                    assert_eq!(e.label(), RpcError::LABEL);
                    assert_eq!(e.to_string(), "Unable to call remote procedure \"greet\"");
                }
                other => panic!("expected rpc error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_per_call_mode_keeps_no_session() {
        let (addr, service) = spawn_greeter().await;
        let config = config_for(addr);
        let invoker = GreetInvoker::new(ConnectionMode::PerCall);

        let response = invoker.greet(&config, "Ada").await.unwrap();
        assert_eq!(response.greetings, "Hello, Ada");
        let response = invoker.greet(&config, "Grace").await.unwrap();
        assert_eq!(response.greetings, "Hello, Grace");

        assert_eq!(service.served(), 2);
        assert_eq!(invoker.session_state().await, SessionState::Unconnected);
    }

    #[tokio::test]
    async fn test_endpoint_change_between_calls() {
        let (first, first_service) = spawn_greeter().await;
        let (second, second_service) = spawn_greeter().await;
        let invoker = GreetInvoker::default();

        invoker.greet(&config_for(first), "Ada").await.unwrap();
        invoker.greet(&config_for(second), "Ada").await.unwrap();

        assert_eq!(first_service.served(), 1);
        assert_eq!(second_service.served(), 1);
    }
}
