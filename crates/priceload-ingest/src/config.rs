//! Configuration management
//!
//! Connection parameters come from the environment (optionally seeded from a
//! `.env` file). Nothing is hard-coded beyond the local-development defaults
//! below; the password in particular has no default.

use priceload_common::{PriceloadError, Result};
use serde::Serialize;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;

// ============================================================================
// Database Configuration Constants
// ============================================================================

/// Default database host.
pub const DEFAULT_DB_HOST: &str = "localhost";

/// Default database port.
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Default database name.
pub const DEFAULT_DB_NAME: &str = "prices";

/// Default database user.
pub const DEFAULT_DB_USER: &str = "postgres";

/// Application name reported to the server (`pg_stat_activity`).
pub const DEFAULT_APPLICATION_NAME: &str = "priceload";

/// Application configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseConfig {
    /// Full connection URL; when present it wins over the individual fields
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub application_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            name: DEFAULT_DB_NAME.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: None,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Build sqlx connect options for a single connection
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let options = match &self.url {
            Some(url) => PgConnectOptions::from_str(url)
                .map_err(|e| PriceloadError::config(format!("invalid DATABASE_URL: {e}")))?,
            None => {
                let options = PgConnectOptions::new()
                    .host(&self.host)
                    .port(self.port)
                    .database(&self.name)
                    .username(&self.user);
                match &self.password {
                    Some(password) => options.password(password),
                    None => options,
                }
            },
        };

        Ok(options.application_name(&self.application_name))
    }

    /// Connection target without credentials, for log lines
    pub fn display_target(&self) -> String {
        match &self.url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!("{}@{}:{}/{}", self.user, self.host, self.port, self.name),
        }
    }
}

impl Config {
    /// Load configuration from `.env` and the process environment
    ///
    /// Environment variables:
    /// - `DATABASE_URL`: full connection URL, overrides the settings below
    /// - `PRICELOAD_DB_HOST`, `PRICELOAD_DB_PORT`, `PRICELOAD_DB_NAME`
    /// - `PRICELOAD_DB_USER`, `PRICELOAD_DB_PASSWORD`
    /// - `PRICELOAD_DB_APPLICATION_NAME`
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = DatabaseConfig::default();

        let port = match lookup("PRICELOAD_DB_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| PriceloadError::invalid_setting("PRICELOAD_DB_PORT", raw))?,
            None => defaults.port,
        };

        let config = Config {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
                host: lookup("PRICELOAD_DB_HOST").unwrap_or(defaults.host),
                port,
                name: lookup("PRICELOAD_DB_NAME").unwrap_or(defaults.name),
                user: lookup("PRICELOAD_DB_USER").unwrap_or(defaults.user),
                password: lookup("PRICELOAD_DB_PASSWORD"),
                application_name: lookup("PRICELOAD_DB_APPLICATION_NAME")
                    .unwrap_or(defaults.application_name),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let db = &self.database;

        // A URL carries its own host/port/name
        if db.url.is_some() {
            return Ok(());
        }

        if db.host.trim().is_empty() {
            return Err(PriceloadError::config("database host cannot be empty"));
        }

        if db.port == 0 {
            return Err(PriceloadError::config("database port must be greater than 0"));
        }

        if db.name.trim().is_empty() {
            return Err(PriceloadError::config("database name cannot be empty"));
        }

        if db.user.trim().is_empty() {
            return Err(PriceloadError::config("database user cannot be empty"));
        }

        if db.password.is_none() {
            tracing::warn!("PRICELOAD_DB_PASSWORD is not set - connecting without a password");
        }

        Ok(())
    }
}
