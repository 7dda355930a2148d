//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Blob storage configuration.
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Blob storage configuration.
///
/// Flat settings mapped onto a concrete provider by the server binary. Exactly
/// one backend's fields need to be present for the chosen `backend`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend name: "fs", "s3", or "azblob".
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Root directory (fs backend).
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Endpoint URL (s3 backend).
    #[serde(default)]
    pub endpoint: String,
    /// Bucket name (s3 backend).
    #[serde(default)]
    pub bucket: String,
    /// Access key id (s3 backend).
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key (s3 backend).
    #[serde(default)]
    pub secret_access_key: String,
    /// Region (s3 backend).
    #[serde(default)]
    pub region: String,
    /// Account name (azblob backend).
    #[serde(default)]
    pub account: String,
    /// Account access key (azblob backend).
    #[serde(default)]
    pub access_key: String,
    /// Container name (azblob backend).
    #[serde(default)]
    pub container: String,
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_storage_backend() -> String {
    "fs".to_string()
}

fn default_storage_root() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MURMUR").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
