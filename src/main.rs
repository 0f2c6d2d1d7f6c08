use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use waypost::api;
use waypost::config::Config;
use waypost::geo::GeoResolver;
use waypost::redirect;
use waypost::storage::{SqliteStorage, Storage};
use waypost::tracking::Tracker;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    info!("Using SQLite storage: {}", config.database.url);
    let storage: Arc<dyn Storage> = Arc::new(
        SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
    );

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    // Geolocation resolver with its call-budget guard
    let resolver = Arc::new(GeoResolver::new(&config.geo));
    info!(
        "Geolocation budget: {} calls per {}s window",
        config.geo.call_budget, config.geo.budget_window_secs
    );

    let tracker = Arc::new(Tracker::new(Arc::clone(&storage), resolver));

    // Create routers
    let api_router = api::create_api_router(Arc::clone(&storage), Arc::clone(&tracker));
    let redirect_router = redirect::create_redirect_router(tracker);

    // Start API server
    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("API server listening on http://{}", api_addr);

    // Start redirect server
    let redirect_addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let redirect_listener = tokio::net::TcpListener::bind(&redirect_addr).await?;
    info!("Redirect server listening on http://{}", redirect_addr);

    // Run both servers concurrently
    tokio::try_join!(
        axum::serve(api_listener, api_router),
        axum::serve(redirect_listener, redirect_router),
    )?;

    Ok(())
}
