//! User identity service.
//!
//! Users are created on first osu! login and never deleted. The display
//! name only changes through an explicit refresh against the osu! API,
//! since players rename themselves.

use std::sync::Arc;

use osumod_common::{id::IdGenerator, AppError, AppResult};
use osumod_db::entities::user;
use osumod_db::repositories::UserRepository;
use sea_orm::Set;
use serde::Serialize;

use super::osu::BeatmapProvider;

/// Authenticated identity handed over by the osu! OAuth callback.
#[derive(Debug, Clone)]
pub struct OsuIdentity {
    pub osu_id: i64,
    pub username: String,
    pub country_code: String,
    pub avatar_url: Option<String>,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub osu_id: i64,
    pub username: String,
    pub country_code: String,
    pub avatar_url: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            osu_id: user.osu_id,
            username: user.username,
            country_code: user.country_code,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    provider: Arc<dyn BeatmapProvider>,
    id_gen: IdGenerator,
}

impl UserService {
    #[must_use]
    pub fn new(user_repo: UserRepository, provider: Arc<dyn BeatmapProvider>) -> Self {
        Self {
            user_repo,
            provider,
            id_gen: IdGenerator::new(),
        }
    }

    /// Log a user in from their OAuth identity, creating them on first
    /// visit. Rotates the session token either way.
    pub async fn login(&self, identity: OsuIdentity) -> AppResult<user::Model> {
        let token = self.id_gen.generate_token();
        let now = chrono::Utc::now();

        if let Some(existing) = self.user_repo.find_by_osu_id(identity.osu_id).await? {
            let mut active: user::ActiveModel = existing.into();
            active.username = Set(identity.username.clone());
            active.username_lower = Set(identity.username.to_lowercase());
            active.country_code = Set(identity.country_code);
            active.avatar_url = Set(identity.avatar_url);
            active.token = Set(Some(token));
            active.updated_at = Set(Some(now.into()));
            return self.user_repo.update(active).await;
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            osu_id: Set(identity.osu_id),
            username: Set(identity.username.clone()),
            username_lower: Set(identity.username.to_lowercase()),
            country_code: Set(identity.country_code),
            avatar_url: Set(identity.avatar_url),
            token: Set(Some(token)),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        self.user_repo.create(model).await
    }

    /// Resolve a session token to its user.
    pub async fn authenticate(&self, token: &str) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_token(token).await
    }

    /// Invalidate the user's session token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.token = Set(None);
        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Re-pull the user's current display name from the osu! API.
    pub async fn refresh_username(&self, user_id: &str) -> AppResult<user::Model> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let remote = self.provider.user_by_osu_id(user.osu_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.username = Set(remote.username.clone());
        active.username_lower = Set(remote.username.to_lowercase());
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.user_repo.update(active).await
    }

    /// Look up a user by display name or osu! id.
    pub async fn get_by_identifier(&self, identifier: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| AppError::UserNotFound(identifier.to_string()))
    }
}
