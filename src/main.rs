use std::sync::Arc;

use clap::Parser;
use cloudsmith_backend::api::{self, app_state::AppState};
use cloudsmith_backend::cli::Cli;
use cloudsmith_backend::cloudsmith::HttpPackageSource;
use cloudsmith_backend::config::loader::ConfigLoader;
use cloudsmith_backend::observability::{
    AppMetrics, HealthCheckResult, ObservabilityState, init_tracing,
};
use cloudsmith_backend::server::{SocketServer, shutdown_signal};
use cloudsmith_backend::services::create_catalog_service;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_from(&cli.config, cli.defaults())?;
    cli.apply(&mut config);
    ConfigLoader::validate(&config)?;

    let _log_guard = init_tracing(&config.logging)?;
    info!("Starting Cloudsmith extension backend {}", env!("CARGO_PKG_VERSION"));
    info!(
        api = %config.cloudsmith.base_url,
        page_size = config.cloudsmith.page_size,
        max_pages = config.cloudsmith.max_pages,
        "Configuration loaded successfully"
    );

    let metrics = Arc::new(AppMetrics::new()?);
    let package_source = Arc::new(HttpPackageSource::new(&config.cloudsmith)?);
    let catalog_service =
        create_catalog_service(package_source, config.catalog.clone(), metrics.clone());
    info!("Catalog service initialized");

    let app_state = AppState::new(catalog_service, metrics.clone());
    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION"),
        metrics,
    ));
    let router = api::create_app(app_state, observability_state.clone());

    match &config.server.listen {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("Server listening on {}", addr);
            observability_state
                .add_health_check(HealthCheckResult::healthy("listener", format!("tcp {}", addr)))
                .await;

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        None => {
            let server =
                SocketServer::bind(&config.server.socket_path, config.server.socket_mode)?;
            observability_state
                .add_health_check(HealthCheckResult::healthy(
                    "listener",
                    format!("unix {}", server.path().display()),
                ))
                .await;

            server.serve(router, shutdown_signal()).await?;
        }
    }

    info!("Server stopped");
    Ok(())
}
