//! Hearth - Personal Dashboard Backend
//!
//! A small session-authenticated REST service backing a personal
//! dashboard: per-user links, todos, notes, and calendar events, plus
//! a proxied Open-Meteo forecast lookup. Every endpoint answers with
//! the `{data, error}` envelope.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;
