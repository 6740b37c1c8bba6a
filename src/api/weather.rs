//! Weather proxy routes.
//!
//! Routes:
//! - GET /weather?lat=..&lon=.. - Current conditions and the next hours

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::Envelope;
use crate::services::Forecast;
use crate::{AppState, Error, Result};

/// Build weather routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/weather", get(forecast))
}

#[derive(Debug, Deserialize, Default)]
struct WeatherQuery {
    lat: Option<String>,
    lon: Option<String>,
}

/// Parse a coordinate; empty or non-finite values count as missing.
fn parse_coordinate(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Proxy a forecast lookup to Open-Meteo.
///
/// GET /weather
#[axum::debug_handler]
async fn forecast(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<Envelope<Forecast>>> {
    let lat = parse_coordinate(query.lat.as_deref());
    let lon = parse_coordinate(query.lon.as_deref());

    let (Some(lat), Some(lon)) = (lat, lon) else {
        return Err(Error::Validation(
            "Query parameters lat and lon are required".to_string(),
        ));
    };

    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::Validation(
            "Latitude must be between -90 and 90".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(Error::Validation(
            "Longitude must be between -180 and 180".to_string(),
        ));
    }

    let forecast = state.weather.fetch_forecast(lat, lon).await?;

    Ok(Json(Envelope::data(forecast)))
}
