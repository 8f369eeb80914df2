use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::greeter_proto::greeter_server::{Greeter, GreeterServer};
use crate::greeter_proto::{HelloRequest, HelloResponse};

pub async fn start_server(addr: SocketAddr, service: GreeterService) -> anyhow::Result<()> {
    info!(address = %addr, "gRPC server starting");

    tonic::transport::Server::builder()
        .add_service(GreeterServer::new(service))
        .serve(addr)
        .await?;

    Ok(())
}

/// Serve on an already bound listener, e.g. one bound to port `0` in tests.
pub async fn serve_with_listener(
    listener: TcpListener,
    service: GreeterService,
) -> anyhow::Result<()> {
    info!(address = ?listener.local_addr().ok(), "gRPC server starting");

    tonic::transport::Server::builder()
        .add_service(GreeterServer::new(service))
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await?;

    Ok(())
}

/// Reference `Greeter` implementation answering `"Hello, " + name`.
#[derive(Debug, Clone, Default)]
pub struct GreeterService {
    served: Arc<AtomicUsize>,
}

impl GreeterService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `Greet` requests answered so far, shared between clones.
    pub fn served(&self) -> usize {
        self.served.load(Ordering::Relaxed)
    }
}

pub fn greeting_for(name: &str) -> String {
    format!("Hello, {name}")
}

#[tonic::async_trait]
impl Greeter for GreeterService {
    async fn greet(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloResponse>, Status> {
        let HelloRequest { name } = request.into_inner();

        debug!(name = %name, "Greet request");
        self.served.fetch_add(1, Ordering::Relaxed);

        Ok(Response::new(HelloResponse {
            greetings: greeting_for(&name),
        }))
    }
}
