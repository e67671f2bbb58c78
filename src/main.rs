use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phone_relay::{
    api::{create_router, AppState},
    config::Config,
    db::{BlobStore, MIGRATOR},
    error::AppError,
    oauth::{OAuthClient, OAuthConfig},
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,phone_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting phone-relay v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration; a bad environment fails here, not at first use
    let config = Arc::new(Config::from_env()?);
    tracing::info!("Configuration loaded");

    if !config.oauth_configured() {
        tracing::warn!("GOOGLE_CLIENT_ID/SECRET unset; /login will report a configuration error");
    }

    // Static and upload directories must exist before the router serves them
    tokio::fs::create_dir_all(&config.static_dir).await?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // Setup database
    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Database connected: {}", config.database_url);

    // Run migrations
    MIGRATOR
        .run(&db)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;
    tracing::info!("Database migrations completed");

    let oauth = OAuthClient::new(OAuthConfig::google(&config));
    let blobs = BlobStore::new(&config.upload_dir, config.public_base_url.clone());

    let state = AppState::new(db, oauth, blobs, config.clone());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    tracing::info!("Listening on {}", config.server_address());

    axum::serve(listener, router)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
