//! osu! OAuth login endpoints.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use osumod_common::{AppError, AppResult};
use serde::Deserialize;

use crate::{
    extractors::MaybeAuthUser,
    middleware::{AppState, SESSION_COOKIE},
};

/// Create auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/osu/callback", get(callback))
        .route("/logout", get(logout))
}

/// Redirect to the osu! authorize page.
async fn login(State(state): State<AppState>) -> AppResult<Redirect> {
    let url = state.auth_service.authorize_url()?;
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
}

/// OAuth callback: exchange the code, find or create the user, and
/// start a cookie session with their rotated bearer token.
async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> AppResult<(CookieJar, Redirect)> {
    let identity = state.auth_service.exchange_code(&query.code).await?;
    let user = state.user_service.login(identity).await?;

    let token = user.token.ok_or_else(|| {
        AppError::Internal("login finished without a session token".to_string())
    })?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Redirect::to("/")))
}

/// Invalidate the session token and drop the cookie.
async fn logout(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Redirect)> {
    if let Some(user) = user {
        state.user_service.logout(&user.id).await?;
    }
    Ok((jar.remove(Cookie::from(SESSION_COOKIE)), Redirect::to("/")))
}
