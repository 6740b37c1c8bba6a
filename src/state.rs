//! Application state for Hearth.
//!
//! Contains the shared state that is passed to all handlers.

use std::sync::Arc;

use crate::db::DbPool;
use crate::services::WeatherService;
use crate::{config, Result};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Open-Meteo forecast service.
    pub weather: Arc<WeatherService>,
}

impl AppState {
    /// Create a new application state, initializing all services.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        // Initialize database
        let db = crate::db::init_pool(&config.database.path).await?;

        // Initialize database schema
        crate::db::initialize_schema(&db).await?;

        // Sweep sessions that expired while the server was down
        let swept = crate::db::cleanup_expired_sessions(&db).await?;
        if swept > 0 {
            tracing::info!("Removed {} expired sessions", swept);
        }

        let weather = Arc::new(WeatherService::new(&config.weather.forecast_url));

        Ok(Self { db, weather })
    }
}
