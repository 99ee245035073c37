//! Queue registry.
//!
//! Every user owns at most one non-archived queue. Archiving hides it
//! from the public listing; re-creating it un-archives the existing row
//! instead of inserting a second one.

use osumod_common::{id::IdGenerator, AppError, AppResult};
use osumod_db::entities::queue::{self, GameMode, ModderType};
use osumod_db::entities::user;
use osumod_db::repositories::{QueueRepository, UserRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::user::UserResponse;

/// Longest owner notes accepted.
pub const MAX_NOTES_LENGTH: usize = 5000;

/// Partial settings update; absent fields are left untouched.
///
/// `max_pending` of zero or less means unlimited.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsInput {
    pub max_pending: Option<i32>,
    #[validate(range(min = 0))]
    pub cooldown: Option<i32>,
    pub accept_m4m: Option<bool>,
    pub modder_type: Option<ModderType>,
    #[validate(length(min = 1, message = "At least one gamemode is required"))]
    pub modes: Option<Vec<GameMode>>,
    #[validate(length(max = 100))]
    pub title: Option<String>,
}

/// Full queue view, returned to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueResponse {
    pub id: String,
    pub owner_id: String,
    pub open: bool,
    pub archived: bool,
    pub max_pending: Option<i32>,
    pub cooldown: i32,
    pub accept_m4m: bool,
    pub modder_type: ModderType,
    pub modes: Vec<GameMode>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub last_actioned_at: String,
}

impl From<queue::Model> for QueueResponse {
    fn from(queue: queue::Model) -> Self {
        let modes = queue.game_modes();
        Self {
            id: queue.id,
            owner_id: queue.owner_id,
            open: queue.open,
            archived: queue.archived,
            max_pending: queue.max_pending,
            cooldown: queue.cooldown,
            accept_m4m: queue.accept_m4m,
            modder_type: queue.modder_type,
            modes,
            title: queue.title,
            notes: queue.notes,
            last_actioned_at: queue.last_actioned_at.to_rfc3339(),
        }
    }
}

/// One entry of the public queue listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQueueResponse {
    pub owner: UserResponse,
    pub open: bool,
    pub modder_type: ModderType,
    pub modes: Vec<GameMode>,
    pub title: Option<String>,
    pub last_actioned_at: String,
}

#[derive(Clone)]
pub struct QueueService {
    queue_repo: QueueRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl QueueService {
    #[must_use]
    pub const fn new(queue_repo: QueueRepository, user_repo: UserRepository) -> Self {
        Self {
            queue_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create the owner's queue, or un-archive their previous one.
    ///
    /// An already-active queue is returned unchanged. Reactivation
    /// resets the activity stamps so the maintenance sweep grants the
    /// queue a fresh leniency window.
    pub async fn create_or_reactivate(&self, owner_id: &str) -> AppResult<queue::Model> {
        let now = chrono::Utc::now();

        if let Some(existing) = self.queue_repo.find_by_owner(owner_id).await? {
            if !existing.archived {
                return Ok(existing);
            }
            let mut active: queue::ActiveModel = existing.into();
            active.archived = Set(false);
            active.open = Set(false);
            active.last_actioned_at = Set(now.into());
            active.created_at = Set(now.into());
            active.updated_at = Set(Some(now.into()));
            return self.queue_repo.update(active).await;
        }

        let model = queue::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner_id.to_string()),
            open: Set(false),
            archived: Set(false),
            max_pending: Set(None),
            cooldown: Set(0),
            accept_m4m: Set(false),
            modder_type: Set(ModderType::Modder),
            modes: Set(json!([GameMode::Standard])),
            title: Set(None),
            notes: Set(None),
            last_actioned_at: Set(now.into()),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        self.queue_repo.create(model).await
    }

    /// Merge a partial settings update into the owner's active queue.
    pub async fn update_settings(
        &self,
        owner_id: &str,
        input: UpdateSettingsInput,
    ) -> AppResult<queue::Model> {
        input.validate()?;

        let queue = self.queue_repo.get_active_by_owner(owner_id).await?;
        let mut active: queue::ActiveModel = queue.into();

        if let Some(max_pending) = input.max_pending {
            active.max_pending = Set((max_pending > 0).then_some(max_pending));
        }
        if let Some(cooldown) = input.cooldown {
            active.cooldown = Set(cooldown);
        }
        if let Some(accept_m4m) = input.accept_m4m {
            active.accept_m4m = Set(accept_m4m);
        }
        if let Some(modder_type) = input.modder_type {
            active.modder_type = Set(modder_type);
        }
        if let Some(modes) = input.modes {
            active.modes = Set(json!(modes));
        }
        if let Some(title) = input.title {
            active.title = Set((!title.is_empty()).then_some(title));
        }

        let now = chrono::Utc::now();
        active.last_actioned_at = Set(now.into());
        active.updated_at = Set(Some(now.into()));
        self.queue_repo.update(active).await
    }

    /// Open or close the owner's queue.
    pub async fn set_open(&self, owner_id: &str, open: bool) -> AppResult<queue::Model> {
        let queue = self.queue_repo.get_active_by_owner(owner_id).await?;
        let mut active: queue::ActiveModel = queue.into();
        let now = chrono::Utc::now();
        active.open = Set(open);
        active.last_actioned_at = Set(now.into());
        active.updated_at = Set(Some(now.into()));
        self.queue_repo.update(active).await
    }

    /// Replace the owner notes shown on the request page.
    pub async fn set_notes(&self, owner_id: &str, content: String) -> AppResult<queue::Model> {
        if content.chars().count() > MAX_NOTES_LENGTH {
            return Err(AppError::Validation(format!(
                "Notes must be at most {MAX_NOTES_LENGTH} characters"
            )));
        }

        let queue = self.queue_repo.get_active_by_owner(owner_id).await?;
        let mut active: queue::ActiveModel = queue.into();
        let now = chrono::Utc::now();
        active.notes = Set((!content.is_empty()).then_some(content));
        active.last_actioned_at = Set(now.into());
        active.updated_at = Set(Some(now.into()));
        self.queue_repo.update(active).await
    }

    /// Hide the owner's queue from the public listing.
    pub async fn archive(&self, owner_id: &str) -> AppResult<queue::Model> {
        let queue = self.queue_repo.get_active_by_owner(owner_id).await?;
        let mut active: queue::ActiveModel = queue.into();
        let now = chrono::Utc::now();
        active.archived = Set(true);
        active.open = Set(false);
        active.last_actioned_at = Set(now.into());
        active.updated_at = Set(Some(now.into()));
        self.queue_repo.update(active).await
    }

    /// Resolve an owner identifier to the user and their active queue.
    ///
    /// `Ok((user, None))` means the owner exists but runs no queue,
    /// which callers must keep distinct from an unknown owner.
    pub async fn get_by_owner_identifier(
        &self,
        identifier: &str,
    ) -> AppResult<(user::Model, Option<queue::Model>)> {
        let owner = self
            .user_repo
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| AppError::UserNotFound(identifier.to_string()))?;

        let queue = self.queue_repo.find_active_by_owner(&owner.id).await?;
        Ok((owner, queue))
    }

    /// Public listing of every non-archived queue, most recently
    /// actioned first.
    pub async fn list_public(&self) -> AppResult<Vec<PublicQueueResponse>> {
        let queues = self.queue_repo.list_non_archived().await?;

        let mut listing = Vec::with_capacity(queues.len());
        for queue in queues {
            let owner = self.user_repo.get_by_id(&queue.owner_id).await?;
            let modes = queue.game_modes();
            listing.push(PublicQueueResponse {
                owner: owner.into(),
                open: queue.open,
                modder_type: queue.modder_type,
                modes,
                title: queue.title,
                last_actioned_at: queue.last_actioned_at.to_rfc3339(),
            });
        }

        Ok(listing)
    }
}
