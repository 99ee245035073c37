//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;
use osumod_core::{OsuAuthService, QueueService, RequestService, UserService};

/// Name of the session cookie carrying the bearer token.
pub const SESSION_COOKIE: &str = "osumod_session";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub queue_service: QueueService,
    pub request_service: RequestService,
    pub auth_service: OsuAuthService,
}

/// Authentication middleware.
///
/// Accepts either an `Authorization: Bearer` header or the session
/// cookie; a resolved user lands in the request extensions. Requests
/// without valid credentials pass through anonymously and the
/// extractor decides whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&req) {
        match state.user_service.authenticate(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "token authentication failed");
            }
        }
    }

    next.run(req).await
}

fn extract_token(req: &Request<Body>) -> Option<String> {
    let bearer = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToString::to_string);

    if bearer.is_some() {
        return bearer;
    }

    CookieJar::from_headers(req.headers())
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
