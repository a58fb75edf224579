use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use sulabh_api::{app, config, jobs, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);

    info!("Starting SULABH reporting API v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = middleware::init_metrics() {
        warn!(error = %e, "Prometheus recorder unavailable; /metrics disabled");
    }

    // Database pool, only when a provider needs one
    let pool = if config.needs_database() {
        let db_config = persistence::DatabaseConfig::from(&config.database);
        let pool = persistence::connect(&db_config).await?;

        info!("Running database migrations...");
        persistence::run_migrations(&pool).await?;
        info!("Migrations completed");
        Some(pool)
    } else {
        info!("Running with in-memory data source");
        None
    };

    let providers = app::Providers::from_config(&config, pool)?;

    let mut scheduler = jobs::JobScheduler::new();
    scheduler.register(jobs::ExpiredEntriesJob::new(
        providers.cache.clone(),
        providers.attempts.clone(),
    ));
    if let Some(pool) = providers.pool.clone() {
        scheduler.register(jobs::PoolMetricsJob::new(pool));
    }
    scheduler.start();

    let addr = config.socket_addr()?;
    let app = app::create_app(config, providers)?;

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
