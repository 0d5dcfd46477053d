use std::env;

use auth::TokenConfig;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_days: i64,
}

impl JwtConfig {
    /// Build the token issuer configuration from the loaded settings.
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            access_secret: self.access_secret.clone(),
            refresh_secret: self.refresh_secret.clone(),
            access_ttl: Duration::minutes(self.access_expiry_minutes),
            refresh_ttl: Duration::days(self.refresh_expiry_days),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Directory where stored assets live
    pub root_dir: String,
    /// Public URL prefix under which stored assets are served
    pub base_url: String,
    /// Directory for in-flight multipart uploads
    pub temp_dir: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
