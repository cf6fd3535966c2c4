pub mod auth_routes;
pub mod blocking;
pub mod config;
pub mod error;
pub mod extract;
pub mod health;
pub mod resource_routes;
pub mod routing;
pub mod security;

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use passabola_core::seed::seed_from_dir;
use passabola_core::Platform;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

use config::GatewayConfig;
use routing::build_app;

/// Handle returned when the gateway is started programmatically.
pub struct GatewayHandle {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    finished: tokio::task::JoinHandle<()>,
}

impl GatewayHandle {
    /// Stops accepting connections and waits for the server task to end.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.finished.await;
    }
}

/// Wires the platform from config and imports seed data into empty collections.
pub fn prepare_platform(config: &GatewayConfig) -> Platform {
    let platform = Platform::from_config(&config.core, &config.auth);

    if let Some(seed_dir) = &config.core.seed_dir {
        match seed_from_dir(&platform.store, seed_dir) {
            Ok(report) => {
                for (collection, count) in &report.imported {
                    info!(%collection, count, "dados iniciais importados");
                }
            }
            Err(err) => {
                warn!(%err, seed_dir = %seed_dir.display(), "falha ao importar dados iniciais");
                platform
                    .audit()
                    .log(format!("✗ ERRO ao iniciar aplicação: {err}"));
            }
        }
    }

    platform
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(config: GatewayConfig, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let platform = prepare_platform(&config);
    let router = build_app(&platform, config.security());
    let addr = listener
        .local_addr()
        .context("failed to read socket address")?;

    platform.audit().log("🚀 API Passa a Bola iniciada");
    info!(%addr, data_dir = %config.core.data_dir.display(), "starting passabola-gateway");

    let result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("gateway server terminated with error");

    platform.audit().log("🛑 API Passa a Bola encerrada");
    info!("passabola-gateway stopped");
    result
}

/// Binds `config.core.http_bind` (port 0 allowed) and serves in the background.
pub async fn start_gateway(config: GatewayConfig) -> anyhow::Result<GatewayHandle> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid gateway bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind gateway listener")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read socket address")?;

    let (tx, rx) = oneshot::channel();
    let finished = tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(err) = serve(config, listener, shutdown).await {
            warn!(?err, "gateway task ended with error");
        }
    });

    Ok(GatewayHandle {
        addr: actual_addr,
        shutdown: tx,
        finished,
    })
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
