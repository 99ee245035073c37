//! API endpoints.

mod auth;
mod queues;
mod requests;

use axum::Router;

use crate::middleware::AppState;

/// Router for everything under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(requests::router())
        .merge(queues::router())
}

/// Router for the OAuth login flow under `/auth`.
pub fn auth_router() -> Router<AppState> {
    auth::router()
}
