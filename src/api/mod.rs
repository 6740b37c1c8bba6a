//! API Routes for Hearth
//!
//! This module combines all API routes into a single router and
//! defines the response envelope shared by every endpoint.

mod auth;
mod collections;
mod events;
mod links;
mod notes;
pub mod status;
mod todos;
mod weather;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Router;
use serde::Serialize;

use crate::{AppState, Error};

/// Standard response envelope: exactly one of `data`/`error` is non-null.
/// Handlers produce the data side; `Error::into_response` renders the
/// error side.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn data(value: T) -> Self {
        Self {
            data: Some(value),
            error: None,
        }
    }
}

/// Json extractor whose rejections render as the standard envelope
/// (axum's own rejections are plain text).
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Build the complete API router.
///
/// Route structure:
/// - /health - Health check (public)
/// - /auth/*, /me - Authentication and profile (mixed public/protected)
/// - /links, /todos, /notes, /events - Dashboard collections (session-protected)
/// - /weather - Open-Meteo proxy (public)
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health endpoint (public)
        .merge(status::routes())
        // Authentication and profile routes
        .merge(auth::routes(state.clone()))
        // Per-user dashboard collections
        .nest("/links", links::routes(state.clone()))
        .nest("/todos", todos::routes(state.clone()))
        .nest("/notes", notes::routes(state.clone()))
        .nest("/events", events::routes(state))
        // Weather proxy (public)
        .merge(weather::routes())
        // Anything else under /api is an enveloped 404
        .fallback(not_found)
}

async fn not_found() -> Error {
    Error::NotFound("Not Found".to_string())
}
