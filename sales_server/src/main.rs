use anyhow::Context;
use sales_server::{build_router, init_tracing, AppState, ServerConfig, ServerError};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("failed to read configuration")?;
    init_tracing(&config.log_filter);

    let addr = config.socket_addr()?;
    let state = AppState::new(config);

    match state.current_model().await {
        Ok(artifact) => info!(
            model = %artifact.kind(),
            last_date = %artifact.last_date,
            "serving stored model"
        ),
        Err(ServerError::NotTrained) => info!("no stored model, waiting for an upload"),
        Err(e) => warn!(error = %e, "failed to load stored model"),
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("sales_server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
