//! osu! OAuth 2.0 login flow.
//!
//! Implements the authorization-code exchange against the osu! OAuth v2
//! endpoints and fetches the authenticated identity from `/api/v2/me`.
//! Session management itself lives in [`super::user::UserService`].

use osumod_common::{config::OsuConfig, AppError, AppResult};
use serde::Deserialize;
use url::Url;

use super::user::OsuIdentity;

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct MePayload {
    id: i64,
    username: String,
    country_code: String,
    avatar_url: Option<String>,
}

/// Client for the osu! OAuth v2 identity exchange.
#[derive(Clone)]
pub struct OsuAuthService {
    http: reqwest::Client,
    api_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl OsuAuthService {
    #[must_use]
    pub fn new(config: &OsuConfig, public_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: format!("{public_url}/auth/osu/callback"),
        }
    }

    /// The osu! authorize URL the login endpoint redirects to.
    pub fn authorize_url(&self) -> AppResult<String> {
        let url = Url::parse_with_params(
            &format!("{}/oauth/authorize", self.api_base),
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "identify"),
            ],
        )
        .map_err(|e| AppError::Config(format!("invalid osu! api_base: {e}")))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for the caller's osu! identity.
    pub async fn exchange_code(&self, code: &str) -> AppResult<OsuIdentity> {
        let token: TokenPayload = self
            .http
            .post(format!("{}/oauth/token", self.api_base))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("osu! token exchange failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("osu! token exchange rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("osu! token payload malformed: {e}")))?;

        let me: MePayload = self
            .http
            .get(format!("{}/api/v2/me", self.api_base))
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("osu! identity fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("osu! identity fetch rejected: {e}")))?
            .json()
            .await
            .map_err(|e| {
                AppError::ExternalService(format!("osu! identity payload malformed: {e}"))
            })?;

        Ok(OsuIdentity {
            osu_id: me.id,
            username: me.username,
            country_code: me.country_code,
            avatar_url: me.avatar_url,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> OsuConfig {
        OsuConfig {
            client_id: "1234".to_string(),
            client_secret: "secret".to_string(),
            api_key: "key".to_string(),
            api_base: "https://osu.ppy.sh".to_string(),
        }
    }

    #[test]
    fn test_authorize_url() {
        let service = OsuAuthService::new(&test_config(), "https://osumod.example");
        let url = service.authorize_url().unwrap();
        assert!(url.starts_with("https://osu.ppy.sh/oauth/authorize?"));
        assert!(url.contains("client_id=1234"));
        assert!(url.contains("scope=identify"));
        assert!(url.contains("osumod.example%2Fauth%2Fosu%2Fcallback"));
    }
}
