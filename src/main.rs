use std::sync::Arc;

use agent_coordinator::api;
use agent_coordinator::config::Settings;
use agent_coordinator::coordinator::Coordinator;
use agent_coordinator::infrastructure::execution::EchoExecutor;
use agent_coordinator::infrastructure::repositories::{sqlite_repositories, sqlite_store};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env().expect("Invalid configuration");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = sqlite_store::connect(&settings.database_url, 5)
        .await
        .expect("Failed to connect to database");
    sqlite_store::migrate(&pool)
        .await
        .expect("Failed to apply schema");

    tracing::info!("Database connected successfully");

    let coordinator = Coordinator::new(
        settings.coordinator.clone(),
        sqlite_repositories(pool),
        Arc::new(EchoExecutor::new()),
        None,
    )
    .expect("Invalid coordinator configuration");
    coordinator
        .initialize()
        .await
        .expect("Failed to initialize coordinator");
    let scheduler = coordinator.start();

    let app = api::router(coordinator);

    // Start server
    tracing::info!("Server listening on {}", settings.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
        .expect("Server failed");

    scheduler.shutdown().await;
    tracing::info!("Shutdown complete");
}
