pub mod core;

use std::net::SocketAddr;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::core::routes::{build_router, AppState};
use crate::core::service::CoreService;
use crate::core::settings::RuntimeSettings;

pub async fn run(settings: RuntimeSettings) -> anyhow::Result<()> {
    let core = CoreService::new(&settings).await?;

    let app = build_router(AppState { core }, settings.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
    tracing::info!("shutting down");
}
