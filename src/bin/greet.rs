use anyhow::{Result, bail};
use futures::future::join_all;
use greeter_bridge::{ConnectionMode, EndpointConfig, GREETER_SERVICE, GreetInput, GreeterModule};
use tracing::info;

const DEFAULT_HOST: &str = "::1";
const DEFAULT_PORT: i64 = 50051;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let mut config = EndpointConfig::from_env();
    if config.host.is_none() {
        config.set_host(DEFAULT_HOST);
    }
    if config.port.is_none() {
        config.set_port(DEFAULT_PORT);
    }

    let names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        bail!("usage: greet <name>...");
    }

    let module = GreeterModule::with_config(config, ConnectionMode::Reuse);

    info!(
        service = GREETER_SERVICE,
        config = ?module.config(),
        count = names.len(),
        "Greeting"
    );

    let promises = names
        .iter()
        .map(|name| module.greet(GreetInput::new(name.as_str())));
    let outcomes = join_all(promises).await;

    let mut failed = 0;
    for (name, outcome) in names.iter().zip(outcomes) {
        match outcome {
            Ok(reply) => println!("{}", reply.greetings),
            Err(rejection) => {
                failed += 1;
                eprintln!("[{name}] {}: {rejection}", rejection.code);
            }
        }
    }

    module.close().await;

    if failed > 0 {
        bail!("{failed} of {} greets failed", names.len());
    }

    Ok(())
}
