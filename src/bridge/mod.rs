//! Host-facing surface of the Greeter client.
//!
//! [`GreeterModule`] mirrors the three operations a host application calls: `set_host`,
//! `set_port` and `greet`. Configuration is kept as mutable state owned by the module, while each
//! `greet` snapshots it and runs on the tokio runtime so the host is never blocked. The returned
//! [`Promise`] settles exactly once, with either a [`GreetReply`] or a [`Rejection`].
//!
//! ```ignore
//! let module = GreeterModule::new();
//! module.set_host("localhost");
//! module.set_port(50051);
//!
//! let reply = module.greet(GreetInput::new("Ada")).await?;
//! assert_eq!(reply.greetings, "Hello, Ada");
//! ```

pub mod error;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::endpoint::EndpointConfig;
use crate::invoker::error::{GreetError, RpcError};
use crate::invoker::{ConnectionMode, GreetInvoker};

use self::error::{MissingField, Rejection};

/// Input map for [`GreeterModule::greet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GreetInput {
    pub name: Option<String>,
}

impl GreetInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl From<&str> for GreetInput {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Success payload of [`GreeterModule::greet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetReply {
    pub greetings: String,
}

/// Settles once with the outcome of a spawned call.
///
/// If the call ends without reporting an outcome the promise rejects rather than staying pending.
#[derive(Debug)]
#[must_use = "a promise does nothing unless awaited"]
pub struct Promise<T> {
    outcome: oneshot::Receiver<Result<T, Rejection>>,
}

impl<T> Promise<T> {
    /// A promise that has already settled with `rejection`.
    fn rejected(rejection: Rejection) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(rejection));
        Self { outcome: rx }
    }
}

impl<T> Future for Promise<T> {
    type Output = Result<T, Rejection>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.outcome.poll_unpin(cx).map(|outcome| {
            outcome.unwrap_or_else(|_| Err(Rejection::new("call ended before settling")))
        })
    }
}

pub struct GreeterModule {
    config: Mutex<EndpointConfig>,
    invoker: Arc<GreetInvoker>,
    runtime: Option<Handle>,
}

impl GreeterModule {
    /// Name under which the module is registered with the host.
    pub const NAME: &'static str = "GrpcModule";

    pub fn new() -> Self {
        Self::with_mode(ConnectionMode::default())
    }

    pub fn with_mode(mode: ConnectionMode) -> Self {
        Self::with_config(EndpointConfig::new(), mode)
    }

    pub fn with_config(config: EndpointConfig, mode: ConnectionMode) -> Self {
        Self {
            config: Mutex::new(config),
            invoker: Arc::new(GreetInvoker::new(mode)),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Spawn greets on `runtime`, so `greet` can be called from threads outside of it.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn set_host(&self, host: impl Into<String>) {
        self.config
            .lock()
            .expect("endpoint config lock poisoned")
            .set_host(host);
    }

    pub fn set_port(&self, port: i64) {
        self.config
            .lock()
            .expect("endpoint config lock poisoned")
            .set_port(port);
    }

    /// Snapshot of the current endpoint configuration.
    pub fn config(&self) -> EndpointConfig {
        self.config
            .lock()
            .expect("endpoint config lock poisoned")
            .clone()
    }

    /// Greet `input.name` on the configured endpoint.
    ///
    /// The configuration is captured when this is called; later `set_host`/`set_port` calls only
    /// affect later greets. The call runs on the runtime the module was created in or given via
    /// [`with_runtime`](Self::with_runtime), falling back to the caller's runtime. Without any
    /// runtime the promise rejects immediately.
    pub fn greet(&self, input: GreetInput) -> Promise<GreetReply> {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            warn!("greet called without a tokio runtime");
            return Promise::rejected(Rejection::new("no tokio runtime available"));
        };

        let config = self.config();
        let invoker = Arc::clone(&self.invoker);
        let (tx, rx) = oneshot::channel();

        runtime.spawn(async move {
            let settled = settle(&invoker, &config, input).await;

            if let Err(rejection) = &settled {
                debug!(cause = %rejection.cause, "greet rejected");
            }

            // The host may have dropped the promise; there is nobody left to notify.
            let _ = tx.send(settled);
        });

        Promise { outcome: rx }
    }

    /// Close the module's channel session. Later greets reject.
    pub async fn close(&self) {
        self.invoker.close().await;
    }
}

impl Default for GreeterModule {
    fn default() -> Self {
        Self::new()
    }
}

/// Endpoint configuration is checked before the input, so a missing host or port is reported
/// even when the name is missing too.
async fn settle(
    invoker: &GreetInvoker,
    config: &EndpointConfig,
    input: GreetInput,
) -> Result<GreetReply, Rejection> {
    let outcome = match (config.validate(), input.name) {
        (Err(e), _) => Err(GreetError::Config(e)),
        (Ok(_), None) => Err(GreetError::Rpc(RpcError::new(MissingField { field: "name" }))),
        (Ok(_), Some(name)) => invoker.greet(config, name).await,
    };

    outcome
        .map(|response| GreetReply {
            greetings: response.greetings,
        })
        .map_err(Rejection::from)
}
