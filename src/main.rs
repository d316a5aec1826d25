use std::sync::Arc;
use tokio::net::TcpListener;
use page_extractor::{
    config::Config,
    api::routes::create_router,
    scraper::Extractor,
    store::InMemoryStore,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;
    tracing::info!(
        timeout = ?config.extractor.timeout,
        max_redirects = config.extractor.max_redirects,
        max_body_bytes = config.extractor.max_body_bytes,
        "extractor configured"
    );

    // Create application state
    let extractor = Extractor::new(config.extractor)?;
    let app_state = AppState::new(extractor, Arc::new(InMemoryStore::new()));

    // Build the router with routes
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;

    // Start the server
    tracing::info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
