use anyhow::Context;
use passabola_gateway::config::GatewayConfig;
use passabola_gateway::{serve, shutdown_signal};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    if let Err(err) = passabola_core::logging::init_tracing(None) {
        eprintln!("⚠️ failed to initialise tracing: {err}");
    }

    let config = GatewayConfig::from_env().context("failed to load gateway configuration")?;
    let listener = TcpListener::bind(config.bind_address())
        .await
        .context("failed to bind TCP listener")?;

    serve(config, listener, shutdown_signal()).await
}
