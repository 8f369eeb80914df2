//! Error types for greet invocations.

use std::error::Error as StdError;

use crate::endpoint::error::ConfigError;

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Opaque failure of a remote `greet` call.
///
/// Every failure past configuration validation surfaces as this one error with a fixed
/// [`label`](Self::label) and message. The underlying cause is kept as the error
/// [`source`](std::error::Error::source) for diagnostics only.
#[derive(Debug, thiserror::Error)]
#[error("Unable to call remote procedure \"greet\"")]
pub struct RpcError {
    #[source]
    cause: Cause,
}

impl RpcError {
    pub const LABEL: &'static str = "Error";

    pub(crate) fn new(cause: impl Into<Cause>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    pub fn label(&self) -> &'static str {
        Self::LABEL
    }
}

/// Outcome of a failed [`GreetInvoker::greet`](super::GreetInvoker::greet).
#[derive(Debug, thiserror::Error)]
pub enum GreetError {
    /// The endpoint configuration was unusable. No network activity took place.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}
