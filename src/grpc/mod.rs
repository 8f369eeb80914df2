//! Reference implementation of the `greeter.Greeter` service.

mod server;

pub use crate::greeter_proto::greeter_client::GreeterClient;
pub use server::{GreeterService, greeting_for, serve_with_listener, start_server};
