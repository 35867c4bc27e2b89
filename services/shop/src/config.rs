//! Service configuration loaded from `APP_*` environment variables

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Interface to bind (default: 0.0.0.0)
    pub host: String,
    /// Port to listen on (default: 3000)
    pub port: u16,
    /// Origin allowed by CORS; any origin when unset
    pub cors_origin: Option<String>,
    /// Fallback log filter when `RUST_LOG` is not set (default: info)
    pub log_level: String,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `APP_HOST`
    /// - `APP_PORT`
    /// - `APP_CORS_ORIGIN`
    /// - `APP_LOG_LEVEL`
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
