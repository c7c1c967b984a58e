use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated. Absent or `*` allows any origin.
    pub cors_origins: Option<String>,

    /// Frames buffered per session before a slow peer is evicted
    #[serde(default = "default_session_queue_capacity")]
    pub session_queue_capacity: usize,

    /// Lock shards backing the room table
    #[serde(default = "default_room_shards")]
    pub room_shards: usize,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                Ok(config.normalized())
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    fn normalized(mut self) -> Self {
        if self.session_queue_capacity == 0 {
            self.session_queue_capacity = 1;
        }
        self
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Explicit origin allow-list, or `None` when any origin is accepted.
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        let raw = self.cors_origins.as_deref()?;
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            session_queue_capacity: default_session_queue_capacity(),
            room_shards: default_room_shards(),
            service_name: default_service_name(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_session_queue_capacity() -> usize {
    256
}

fn default_room_shards() -> usize {
    256
}

fn default_service_name() -> String {
    "proposal-relay".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:8000");
        assert_eq!(config.session_queue_capacity, 256);
        assert!(config.is_development());
        assert!(config.allowed_origins().is_none());
    }

    #[test]
    fn test_allowed_origins_parsing() {
        let config = Config {
            cors_origins: Some("http://localhost:3000, https://app.example.com,".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.allowed_origins(),
            Some(vec![
                "http://localhost:3000".to_string(),
                "https://app.example.com".to_string()
            ])
        );

        let wildcard = Config {
            cors_origins: Some("*".to_string()),
            ..Config::default()
        };
        assert!(wildcard.allowed_origins().is_none());
    }

    #[test]
    fn test_zero_queue_capacity_is_raised() {
        let config = Config {
            session_queue_capacity: 0,
            ..Config::default()
        }
        .normalized();
        assert_eq!(config.session_queue_capacity, 1);
    }

    #[test]
    fn test_deserialize_from_env_pairs() {
        let vars = vec![
            ("PORT".to_string(), "9100".to_string()),
            ("SESSION_QUEUE_CAPACITY".to_string(), "8".to_string()),
            ("ROOM_SHARDS".to_string(), "1024".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.session_queue_capacity, 8);
        assert_eq!(config.room_shards, 1024);
        assert_eq!(config.host, "0.0.0.0");
    }
}
