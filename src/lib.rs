pub mod bridge;
pub mod endpoint;
pub mod grpc;
pub mod invoker;
pub mod session;

pub mod greeter_proto {
    include!(concat!(env!("OUT_DIR"), "/greeter.rs"));
}

/// Fully qualified name of the remote service.
pub const GREETER_SERVICE: &str = "greeter.Greeter";

/// Default address served by the reference Greeter service.
pub const DEFAULT_GREETER_ADDR: &str = "[::1]:50051";

pub use bridge::error::Rejection;
pub use bridge::{GreetInput, GreetReply, GreeterModule, Promise};
pub use endpoint::error::ConfigError;
pub use endpoint::{EndpointConfig, Target};
pub use invoker::error::{GreetError, RpcError};
pub use invoker::{ConnectionMode, GreetInvoker, GreetResponse};
pub use session::error::SessionError;
pub use session::{ChannelSession, SessionId, SessionState};
