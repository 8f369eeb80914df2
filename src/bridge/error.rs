//! Host-facing failure payload.

use std::error::Error as StdError;

use crate::invoker::error::{GreetError, RpcError};

/// Indicates that the host supplied an input map without a usable field.
#[derive(Debug, thiserror::Error)]
#[error("\"{field}\" is missing from the input")]
pub struct MissingField {
    pub field: &'static str,
}

/// The single rejection a host receives for any failed `greet`.
///
/// `code` and `message` are fixed. `cause` carries the rendered chain of the underlying error and
/// is meant for diagnostics, not for branching on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}: {cause}")]
pub struct Rejection {
    pub code: &'static str,
    pub message: &'static str,
    pub cause: String,
}

impl Rejection {
    pub const MESSAGE: &'static str = "Unable to call remote procedure \"greet\"";

    pub(crate) fn new(cause: impl Into<String>) -> Self {
        Self {
            code: RpcError::LABEL,
            message: Self::MESSAGE,
            cause: cause.into(),
        }
    }
}

impl From<GreetError> for Rejection {
    fn from(err: GreetError) -> Self {
        match err {
            GreetError::Config(e) => Self::new(e.to_string()),
            GreetError::Rpc(e) => Self::new(
                e.source()
                    .map(render_chain)
                    .unwrap_or_else(|| e.to_string()),
            ),
        }
    }
}

fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
