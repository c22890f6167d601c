use std::net::SocketAddr;
use std::sync::Arc;

use gatekeeper::auth::InMemoryUserStore;
use gatekeeper::config::{ConfigSnapshot, preflight};
use gatekeeper::{AppState, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Nothing may bind before the environment has passed the startup check.
    let snapshot = ConfigSnapshot::from_env();
    let config = match preflight::run(&snapshot) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Refusing to start: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: provider={}, listen_port={}, api_prefix={}, request_logging={}",
        config.provider.kind.name(),
        config.listen_port,
        config.use_api_prefix,
        config.use_info_logger
    );

    let users = Arc::new(InMemoryUserStore::new());
    let state = match AppState::from_config(&config, users) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    };

    let app = router(state, config.route_prefix());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
