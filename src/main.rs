use std::{future::IntoFuture, sync::Arc};

use anyhow::Context;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url_shortener::{config::Config, db, models::AppState, router, service::RecordService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let store = db::connect(config.database_url.as_deref())
        .await
        .context("failed to open record store")?;

    let state = Arc::new(AppState {
        service: RecordService::new(store),
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("Server running on http://{}", config.bind_addr);

    let shutdown = Arc::new(Notify::new());
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown({
                let shutdown = shutdown.clone();
                async move { shutdown.notified().await }
            })
            .into_future(),
    );

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    info!("shutting down, waiting up to {:?} for in-flight requests", config.shutdown_grace);
    shutdown.notify_one();

    match tokio::time::timeout(config.shutdown_grace, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            warn!("grace period elapsed, dropping remaining connections");
            server.abort();
        }
    }

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
