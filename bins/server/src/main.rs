//! Murmur API Server
//!
//! Main entry point for the Murmur backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use murmur_api::{AppState, create_router};
use murmur_core::storage::{BlobStore, StorageConfig, StorageProvider};
use murmur_db::connect;
use murmur_shared::{AppConfig, JwtConfig, JwtService};
use murmur_shared::config::StorageSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "murmur=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Create blob store
    let storage_config = storage_config_from_settings(&config.storage);
    let storage = BlobStore::from_config(storage_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize blob store: {e}"))?;
    info!(provider = storage.provider_name(), "Blob store configured");

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage: Arc::new(storage),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Map flat storage settings onto a concrete provider configuration.
fn storage_config_from_settings(settings: &StorageSettings) -> StorageConfig {
    let provider = match settings.backend.as_str() {
        "s3" => StorageProvider::s3(
            &settings.endpoint,
            &settings.bucket,
            &settings.access_key_id,
            &settings.secret_access_key,
            &settings.region,
        ),
        "azblob" => StorageProvider::azure_blob(
            &settings.account,
            &settings.access_key,
            &settings.container,
        ),
        _ => StorageProvider::local_fs(&settings.root),
    };

    StorageConfig::new(provider).with_max_file_size(settings.max_file_size)
}
