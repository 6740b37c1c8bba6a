//! Weather service proxying the Open-Meteo forecast API.
//!
//! Fetches current conditions plus the next hours of forecast in
//! imperial units and reshapes the upstream payload into the compact
//! form the dashboard consumes. No caching, no retries.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Hourly entries returned to the client.
const HOURLY_LIMIT: usize = 12;

/// Service for Open-Meteo forecast lookups.
#[derive(Clone)]
pub struct WeatherService {
    client: Client,
    forecast_url: String,
}

// ============================================================================
// Upstream payload (subset we consume)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct MeteoResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    current: Option<MeteoCurrent>,
    hourly: Option<MeteoHourly>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MeteoCurrent {
    time: Option<String>,
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    weather_code: Option<i64>,
    wind_speed_10m: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MeteoHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    apparent_temperature: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
}

// ============================================================================
// API shape
// ============================================================================

/// Forecast as served by GET /api/weather.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub location: ForecastLocation,
    pub current: ForecastCurrent,
    pub hourly: Vec<ForecastHour>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastCurrent {
    pub at: Option<String>,
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub weather_code: Option<i64>,
    pub wind_speed: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastHour {
    pub at: String,
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub weather_code: Option<i64>,
    pub precipitation_probability: Option<f64>,
}

impl WeatherService {
    /// Create a new weather service against the given forecast endpoint.
    pub fn new(forecast_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("hearth/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            forecast_url: forecast_url.into(),
        }
    }

    /// Fetch the forecast for a coordinate pair.
    ///
    /// Coordinates are forwarded at 4-decimal precision. A non-2xx
    /// upstream status maps to a 502; transport failures bubble up
    /// as internal errors.
    pub async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<Forecast> {
        let mut url = Url::parse(&self.forecast_url)
            .map_err(|e| Error::Internal(format!("Invalid forecast URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("latitude", &format!("{:.4}", lat))
            .append_pair("longitude", &format!("{:.4}", lon))
            .append_pair(
                "current",
                "temperature_2m,apparent_temperature,weather_code,wind_speed_10m",
            )
            .append_pair(
                "hourly",
                "temperature_2m,apparent_temperature,weather_code,precipitation_probability",
            )
            .append_pair("timezone", "auto")
            .append_pair("temperature_unit", "fahrenheit")
            .append_pair("windspeed_unit", "mph")
            .append_pair("precipitation_unit", "inch");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Weather upstream error ({})",
                response.status()
            )));
        }

        let payload: MeteoResponse = response.json().await?;

        Ok(build_forecast(payload))
    }
}

fn build_forecast(payload: MeteoResponse) -> Forecast {
    let current = payload.current.unwrap_or_default();
    let hourly = payload.hourly.unwrap_or_default();

    let hours = hourly
        .time
        .iter()
        .take(HOURLY_LIMIT)
        .enumerate()
        .map(|(i, time)| ForecastHour {
            at: time.clone(),
            temperature: hourly.temperature_2m.get(i).copied().flatten(),
            apparent_temperature: hourly.apparent_temperature.get(i).copied().flatten(),
            weather_code: hourly.weather_code.get(i).copied().flatten(),
            precipitation_probability: hourly.precipitation_probability.get(i).copied().flatten(),
        })
        .collect();

    Forecast {
        location: ForecastLocation {
            latitude: payload.latitude,
            longitude: payload.longitude,
            timezone: payload.timezone,
        },
        current: ForecastCurrent {
            at: current.time,
            temperature: current.temperature_2m,
            apparent_temperature: current.apparent_temperature,
            weather_code: current.weather_code,
            wind_speed: current.wind_speed_10m,
        },
        hourly: hours,
    }
}
