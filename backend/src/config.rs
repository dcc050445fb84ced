//! Configuration management for the Annu ERP server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides, e.g. `ERP__DATABASE__URL`

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Hosted auth provider configuration
    pub auth: AuthConfig,

    /// Report engine settings
    pub reports: ReportsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Base URL of the auth provider, e.g. `https://project.supabase.co`
    pub provider_url: String,

    /// Public (anon) API key sent on every provider request
    pub anon_key: String,

    /// Service role key for admin endpoints
    pub service_role_key: String,

    /// Secret used to verify provider-issued access tokens (HS256)
    pub jwt_secret: String,

    /// Expected `aud` claim
    pub jwt_audience: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportsConfig {
    /// Category name selected by the non-food consumables report
    pub non_food_category: String,

    /// Price changes at or above this percentage are flagged
    pub price_alert_threshold_percent: Decimal,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("ERP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("auth.jwt_audience", "authenticated")?
            .set_default("reports.non_food_category", "Non-Food")?
            .set_default("reports.price_alert_threshold_percent", "10")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ERP_ prefix)
            .add_source(
                Environment::with_prefix("ERP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            non_food_category: "Non-Food".to_string(),
            price_alert_threshold_percent: Decimal::TEN,
        }
    }
}
