use approver_core::{router, AppState, Config};

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let drain_secs = config.shutdown_timeout_secs;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = ?config.mode(),
        max_stored_results = config.max_stored_results,
        summarize_threshold = config.summarize_threshold,
        max_context_tokens = config.max_context_tokens,
        "Starting approver-core"
    );

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    let started = Instant::now();
    let state = Arc::new(AppState::new(config).await?);
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        abilities = state.abilities.read().index.len(),
        "State initialized"
    );

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, build_app(state, metrics))
        .with_graceful_shutdown(shutdown_signal(drain_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "approver_core=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// API routes plus `/metrics`, wrapped in request tracing. The desktop
/// renderer calls from its own origin, hence the permissive CORS layer.
fn build_app(state: Arc<AppState>, metrics: PrometheusHandle) -> Router {
    router(state)
        .route("/metrics", get(move || std::future::ready(metrics.render())))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Resolves on Ctrl+C or SIGTERM, then waits `drain_secs` so in-flight
/// requests can finish.
async fn shutdown_signal(drain_secs: u64) {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C listener failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM listener failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal_name = tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    tracing::info!(signal = signal_name, drain_secs, "Shutdown requested, draining connections");
    tokio::time::sleep(Duration::from_secs(drain_secs)).await;
}
