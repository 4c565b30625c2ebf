//! services/api/src/bin/hunt_api.rs

use hunt_api_lib::{
    adapters::{JwtSessionTokens, PgHuntRepository},
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use hunt_core::{memory::InMemoryHuntRepository, ports::HuntRepository};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let repo: Arc<dyn HuntRepository> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            let repo = PgHuntRepository::new(db_pool);
            info!("Running database migrations...");
            repo.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(repo)
        }
        None => {
            warn!(
                "DATABASE_URL is not set; using the in-memory repository. \
                 Data will not survive a restart."
            );
            Arc::new(InMemoryHuntRepository::new())
        }
    };

    // --- 3. Prepare the Upload Directory ---
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    if config.admin_key.is_none() {
        warn!("ADMIN_KEY is not set; admin socket and uploads are disabled.");
    }

    // --- 4. Build the Shared AppState ---
    let shutdown = CancellationToken::new();
    let app_state = Arc::new(AppState {
        repo,
        tokens: Arc::new(JwtSessionTokens::new(&config.jwt_secret)),
        config: config.clone(),
        shutdown: shutdown.clone(),
    });

    // --- 5. Create the Web Router ---
    let app = build_router(app_state)?;

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped.");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM and cancels `shutdown` so open sockets wind down.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
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
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received.");
    shutdown.cancel();
}
