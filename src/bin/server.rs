use anyhow::Result;
use greeter_bridge::DEFAULT_GREETER_ADDR;
use greeter_bridge::grpc::{self, GreeterService};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let addr = std::env::var("GREETER_ADDR").unwrap_or_else(|_| DEFAULT_GREETER_ADDR.to_string());
    let addr: SocketAddr = addr.parse()?;

    info!(address = %addr, "Serving greeter.Greeter");

    grpc::start_server(addr, GreeterService::new()).await
}
