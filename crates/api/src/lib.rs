//! HTTP layer for osumod.
//!
//! Routes live under `/api`, the OAuth login flow under `/auth`. The
//! auth middleware resolves a bearer token or session cookie to a user
//! model in the request extensions; handlers pick it up through the
//! [`extractors::AuthUser`] extractor.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use middleware::AppState;
