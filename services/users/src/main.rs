use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::database::{DatabaseConfig, health_check, init_pool};
use users::{
    AppState, MIGRATOR, config::ServerConfig, repositories::PgUserRepository, routes,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting users service");

    let server_config = ServerConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config)?;

    // The service still starts when the database is down; requests answer 503
    // until it comes back.
    match health_check(&pool).await {
        Ok(()) => {
            info!("Database connection successful");
            if let Err(e) = MIGRATOR.run(&pool).await {
                error!("Error occurred while migrating database: {}", e);
            }
        }
        Err(e) => error!("Error occurred while connecting with the database: {}", e),
    }

    let app_state = AppState::new(PgUserRepository::new(pool.clone()));

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = server_config.addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Users service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
