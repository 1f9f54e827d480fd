//! Warden - main entry point

use std::sync::Arc;

use clap::Parser;

use warden_backend::{
    api::{routes::create_router, AppState},
    cli::ServeCli,
    config::Config,
    db,
    error::Result,
    telemetry::{init_tracing, DEFAULT_FILTER},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(DEFAULT_FILTER);

    let cli = ServeCli::parse();
    let config = Config::load(&cli.config)?;
    tracing::info!(config = ?config, "Starting Warden");

    let pool = db::create_pool(&config.db).await?;
    tracing::info!("Connected to database");

    if cli.skip_migrations {
        tracing::warn!("Skipping database migrations");
    } else {
        db::run_migrations(&pool).await?;
        tracing::info!("Database migrations complete");
    }

    let addr = config.listen.addr();
    let state = Arc::new(AppState::with_postgres(config, pool));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
