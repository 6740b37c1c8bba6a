//! Service layer for Hearth.
//!
//! - `password` - Argon2id hashing for local credentials
//! - `weather` - Open-Meteo forecast client

mod password;
mod weather;

pub use password::{hash_password, verify_password};
pub use weather::{Forecast, WeatherService};
