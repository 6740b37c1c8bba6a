//! Configuration management for Hearth.
//!
//! Loads configuration from environment variables (with .env support via
//! dotenvy). A single global instance is initialized at startup.

use std::env;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL. Session cookies are marked Secure
    /// when this is https.
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_age_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub forecast_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "4000").parse().expect("Invalid PORT"),
                public_url: env_or("PUBLIC_URL", "http://localhost:4000"),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/hearth.db"),
            },
            session: SessionConfig {
                max_age_seconds: env_or("SESSION_MAX_AGE", "604800")
                    .parse()
                    .unwrap_or(604800), // 7 days
            },
            weather: WeatherConfig {
                forecast_url: env_or("WEATHER_URL", "https://api.open-meteo.com/v1/forecast"),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_env();
        assert!(config.server.port > 0);
        assert!(!config.database.path.is_empty());
        assert!(config.session.max_age_seconds > 0);
        assert!(config.weather.forecast_url.starts_with("http"));
    }
}
