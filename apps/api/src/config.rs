//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults; a `.env` file is honored at startup. `DATABASE_URL` is the only
//! required variable - the media host is optional and, when absent, image
//! uploads are rejected at request time.

use std::env;
use std::time::Duration;

use stockroom_db::DbConfig;

use crate::media::MediaConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port.
    pub port: u16,

    /// PostgreSQL connection string.
    pub database_url: String,

    /// Connection pool upper bound.
    pub db_max_connections: u32,

    /// Seconds to wait for a pooled connection before failing a request.
    pub db_connect_timeout_secs: u64,

    /// Seconds an idle connection is kept before being closed.
    pub db_idle_timeout_secs: u64,

    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,

    /// Media host credentials; `None` disables uploads.
    pub media: Option<MediaConfig>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT"))?,

            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingRequired("DATABASE_URL"))?,

            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS"))?,

            db_connect_timeout_secs: env::var("DB_CONNECT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_CONNECT_TIMEOUT_SECS"))?,

            db_idle_timeout_secs: env::var("DB_IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_IDLE_TIMEOUT_SECS"))?,

            allowed_origins: parse_allowed_origins(
                &env::var("ALLOWED_ORIGINS").unwrap_or_default(),
            ),

            media: match env::var("MEDIA_BASE_URL") {
                Ok(base_url) => Some(MediaConfig {
                    base_url,
                    api_key: env::var("MEDIA_API_KEY")
                        .map_err(|_| ConfigError::MissingRequired("MEDIA_API_KEY"))?,
                    folder: env::var("MEDIA_UPLOAD_FOLDER")
                        .unwrap_or_else(|_| "items".to_string()),
                }),
                Err(_) => None,
            },
        };

        Ok(config)
    }

    /// The database pool configuration this server configuration implies.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_url)
            .max_connections(self.db_max_connections)
            .connect_timeout(Duration::from_secs(self.db_connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.db_idle_timeout_secs))
    }
}

/// Splits a comma-separated origin list, dropping blanks.
pub fn parse_allowed_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    InvalidValue(&'static str),

    #[error("missing required configuration: {0}")]
    MissingRequired(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_list_parsing() {
        assert!(parse_allowed_origins("").is_empty());
        assert!(parse_allowed_origins(" , ,").is_empty());
        assert_eq!(
            parse_allowed_origins("http://localhost:5173, https://stock.example.com"),
            vec![
                "http://localhost:5173".to_string(),
                "https://stock.example.com".to_string(),
            ]
        );
    }
}
