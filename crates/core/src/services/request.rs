//! Request admission and lifecycle.
//!
//! Submission runs the admission rules and persists a `Pending` request
//! with a snapshot of the map's metadata. Everything after that is
//! owner-driven: status/feedback edits, snapshot refresh, deletion and
//! bulk archival.

use std::sync::Arc;

use chrono::{Duration, Utc};
use osumod_common::{id::IdGenerator, AppError, AppResult};
use osumod_db::entities::queue;
use osumod_db::entities::request::{self, RequestStatus};
use osumod_db::repositories::{
    ArchiveBatchFilter, QueueRepository, RequestRepository, UserRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::admission;
use super::osu::{BeatmapProvider, MapDescriptor};

/// Page size of the request listings.
pub const PAGE_SIZE: u64 = 50;

/// Outcome of a submission attempt.
///
/// `errors` non-empty means nothing was persisted; the descriptor is
/// still returned so the form can redisplay the map alongside the
/// reasons.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestResponse>,
    pub errors: Vec<String>,
}

/// Owner edit of a request; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequestInput {
    pub status: Option<RequestStatus>,
    pub feedback: Option<String>,
    pub archived: Option<bool>,
}

/// Filter for bulk archival.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveBatchInput {
    pub status: Option<RequestStatus>,
    /// Only archive requests at least this many days old.
    pub age: Option<i64>,
}

/// Serialized view of a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub id: String,
    pub requester_id: String,
    pub target_id: String,
    pub request_date: String,
    pub map_id: i64,
    pub mapset_id: Option<i64>,
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub bpm: f64,
    pub length: String,
    pub diffs: Vec<request::Diff>,
    pub approval_status: request::ApprovalStatus,
    pub image_url: String,
    pub comment: String,
    pub m4m: bool,
    pub status: RequestStatus,
    pub feedback: Option<String>,
    pub archived: bool,
}

impl From<request::Model> for RequestResponse {
    fn from(request: request::Model) -> Self {
        let diffs = request.difficulties();
        Self {
            id: request.id,
            requester_id: request.requester_id,
            target_id: request.target_id,
            request_date: request.request_date.to_rfc3339(),
            map_id: request.map_id,
            mapset_id: request.mapset_id,
            title: request.title,
            artist: request.artist,
            creator: request.creator,
            bpm: request.bpm,
            length: request.length,
            diffs,
            approval_status: request.approval_status,
            image_url: request.image_url,
            comment: request.comment,
            m4m: request.m4m,
            status: request.status,
            feedback: request.feedback,
            archived: request.archived,
        }
    }
}

#[derive(Clone)]
pub struct RequestService {
    request_repo: RequestRepository,
    queue_repo: QueueRepository,
    user_repo: UserRepository,
    provider: Arc<dyn BeatmapProvider>,
    id_gen: IdGenerator,
}

impl RequestService {
    #[must_use]
    pub fn new(
        request_repo: RequestRepository,
        queue_repo: QueueRepository,
        user_repo: UserRepository,
        provider: Arc<dyn BeatmapProvider>,
    ) -> Self {
        Self {
            request_repo,
            queue_repo,
            user_repo,
            provider,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a mapset to a target queue.
    ///
    /// Admission failures are collected, not thrown; the queue owner
    /// bypasses them entirely so they can test their own form. On
    /// success the queue auto-closes once its pending count reaches
    /// `max_pending`.
    pub async fn submit(
        &self,
        requester_id: &str,
        target_identifier: &str,
        mapset_id: i64,
        comment: String,
        m4m: bool,
    ) -> AppResult<SubmitOutcome> {
        let descriptor = match self.resolve_mapset(mapset_id).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::warn!(mapset_id, error = %e, "beatmap lookup failed");
                return Ok(SubmitOutcome {
                    map: None,
                    request: None,
                    errors: vec!["Invalid beatmap identifier".to_string()],
                });
            }
        };

        let owner = self
            .user_repo
            .find_by_identifier(target_identifier)
            .await?
            .ok_or_else(|| AppError::UserNotFound(target_identifier.to_string()))?;
        let queue = self.queue_repo.get_active_by_owner(&owner.id).await?;

        let prior = self
            .request_repo
            .find_latest_by_requester_and_target(requester_id, &owner.id)
            .await?;

        let now = Utc::now();
        let mut errors = admission::evaluate(&queue, &descriptor, prior.as_ref(), &comment, now);

        // The owner may always submit to their own queue.
        if requester_id == owner.id {
            errors.clear();
        }

        if !errors.is_empty() {
            return Ok(SubmitOutcome {
                map: Some(descriptor),
                request: None,
                errors,
            });
        }

        let model = request::ActiveModel {
            id: Set(self.id_gen.generate()),
            requester_id: Set(requester_id.to_string()),
            target_id: Set(owner.id.clone()),
            request_date: Set(now.into()),
            map_id: Set(descriptor.map_id),
            mapset_id: Set(Some(descriptor.mapset_id)),
            title: Set(descriptor.title.clone()),
            artist: Set(descriptor.artist.clone()),
            creator: Set(descriptor.creator.clone()),
            bpm: Set(descriptor.bpm),
            length: Set(descriptor.length.clone()),
            diffs: Set(json!(descriptor.diffs)),
            approval_status: Set(descriptor.approval_status),
            image_url: Set(descriptor.image_url.clone()),
            comment: Set(comment),
            m4m: Set(m4m),
            status: Set(RequestStatus::Pending),
            feedback: Set(None),
            archived: Set(false),
        };

        let created = self.request_repo.create(model).await?;
        self.close_if_at_capacity(queue).await?;

        Ok(SubmitOutcome {
            map: Some(descriptor),
            request: Some(created.into()),
            errors: vec![],
        })
    }

    /// Force `open = false` once the pending count reaches the cap.
    ///
    /// The count is read after the insert, so two concurrent
    /// submissions may briefly exceed the cap; the queue still closes.
    /// The sweep never re-opens a queue and neither does this.
    async fn close_if_at_capacity(&self, queue: queue::Model) -> AppResult<()> {
        let Some(max_pending) = queue.max_pending else {
            return Ok(());
        };
        if !queue.open {
            return Ok(());
        }

        let pending = self.request_repo.count_pending_by_target(&queue.owner_id).await?;
        if pending >= u64::from(max_pending.unsigned_abs()) {
            tracing::info!(owner_id = %queue.owner_id, pending, "queue reached capacity, closing");
            let mut active: queue::ActiveModel = queue.into();
            active.open = Set(false);
            active.updated_at = Set(Some(Utc::now().into()));
            self.queue_repo.update(active).await?;
        }
        Ok(())
    }

    /// Owner edit of status, feedback or archival flag.
    ///
    /// The status must belong to the vocabulary of the target queue's
    /// modder type at call time.
    pub async fn edit(
        &self,
        request_id: &str,
        editor_id: &str,
        input: EditRequestInput,
    ) -> AppResult<request::Model> {
        let request = self.request_repo.get_by_id(request_id).await?;
        if request.target_id != editor_id {
            return Err(AppError::Forbidden(
                "Only the queue owner can edit a request".to_string(),
            ));
        }

        // The owner keeps control of their requests even after the
        // queue is archived; archival is a soft flag on the same row.
        let queue = self
            .queue_repo
            .find_by_owner(editor_id)
            .await?
            .ok_or_else(|| AppError::QueueNotFound(editor_id.to_string()))?;

        if let Some(status) = input.status {
            if !queue.modder_type.vocabulary().contains(&status) {
                return Err(AppError::Validation(
                    "Status is not available for this queue type".to_string(),
                ));
            }
        }

        let mut active: request::ActiveModel = request.into();
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(feedback) = input.feedback {
            active.feedback = Set((!feedback.is_empty()).then_some(feedback));
        }
        if let Some(archived) = input.archived {
            active.archived = Set(archived);
        }

        let updated = self.request_repo.update(active).await?;
        self.touch_queue(queue).await?;
        Ok(updated)
    }

    /// Re-pull the map snapshot from the osu! API, keeping the
    /// owner-managed fields intact.
    ///
    /// Legacy rows without a mapset id recover it through a secondary
    /// per-difficulty lookup first.
    pub async fn refresh(&self, request_id: &str, editor_id: &str) -> AppResult<request::Model> {
        let request = self.request_repo.get_by_id(request_id).await?;
        if request.target_id != editor_id {
            return Err(AppError::Forbidden(
                "Only the queue owner can refresh a request".to_string(),
            ));
        }

        let mapset_id = match request.mapset_id {
            Some(id) => id,
            None => self
                .provider
                .beatmap_by_id(request.map_id)
                .await?
                .map(|b| b.beatmapset_id)
                .ok_or_else(|| {
                    AppError::NotFound("Beatmap no longer exists upstream".to_string())
                })?,
        };

        let descriptor = self.resolve_mapset(mapset_id).await?;

        let mut active: request::ActiveModel = request.into();
        active.map_id = Set(descriptor.map_id);
        active.mapset_id = Set(Some(descriptor.mapset_id));
        active.title = Set(descriptor.title);
        active.artist = Set(descriptor.artist);
        active.creator = Set(descriptor.creator);
        active.bpm = Set(descriptor.bpm);
        active.length = Set(descriptor.length);
        active.diffs = Set(json!(descriptor.diffs));
        active.approval_status = Set(descriptor.approval_status);
        active.image_url = Set(descriptor.image_url);

        self.request_repo.update(active).await
    }

    /// Delete a request. Allowed for the requester and the queue owner.
    pub async fn delete(&self, request_id: &str, actor_id: &str) -> AppResult<()> {
        let request = self.request_repo.get_by_id(request_id).await?;
        if request.requester_id != actor_id && request.target_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the requester or the queue owner can delete a request".to_string(),
            ));
        }
        self.request_repo.delete(request_id).await
    }

    /// Bulk-archive the owner's non-archived requests. A zero count
    /// means nothing matched, which is not an error.
    pub async fn archive_batch(
        &self,
        owner_id: &str,
        input: ArchiveBatchInput,
    ) -> AppResult<u64> {
        let queue = self
            .queue_repo
            .find_by_owner(owner_id)
            .await?
            .ok_or_else(|| AppError::QueueNotFound(owner_id.to_string()))?;

        let filter = ArchiveBatchFilter {
            status: input.status,
            before: input.age.map(|days| (Utc::now() - Duration::days(days)).into()),
        };

        let modified = self.request_repo.archive_matching(owner_id, &filter).await?;
        self.touch_queue(queue).await?;
        Ok(modified)
    }

    /// A page of requests for a target queue, newest first.
    pub async fn page_for_target(
        &self,
        target_identifier: &str,
        archived: bool,
        cursor: Option<&str>,
    ) -> AppResult<Vec<request::Model>> {
        let owner = self
            .user_repo
            .find_by_identifier(target_identifier)
            .await?
            .ok_or_else(|| AppError::UserNotFound(target_identifier.to_string()))?;

        self.request_repo
            .page_by_target(&owner.id, archived, cursor, PAGE_SIZE)
            .await
    }

    /// A page of the caller's own outbound requests, newest first.
    pub async fn page_for_requester(
        &self,
        requester_id: &str,
        cursor: Option<&str>,
    ) -> AppResult<Vec<request::Model>> {
        self.request_repo
            .page_by_requester(requester_id, cursor, PAGE_SIZE)
            .await
    }

    async fn resolve_mapset(&self, mapset_id: i64) -> AppResult<MapDescriptor> {
        let beatmaps = self.provider.beatmaps_by_mapset(mapset_id).await?;
        MapDescriptor::from_raw(mapset_id, beatmaps)
    }

    async fn touch_queue(&self, queue: queue::Model) -> AppResult<()> {
        let mut active: queue::ActiveModel = queue.into();
        let now = Utc::now();
        active.last_actioned_at = Set(now.into());
        active.updated_at = Set(Some(now.into()));
        self.queue_repo.update(active).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::osu::{RawBeatmap, RawOsuUser};
    use async_trait::async_trait;
    use maplit::btreemap;
    use osumod_db::entities::queue::{GameMode, ModderType};
    use osumod_db::entities::request::ApprovalStatus;
    use osumod_db::entities::user;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    struct StubProvider {
        beatmaps: AppResult<Vec<RawBeatmap>>,
    }

    impl StubProvider {
        fn with_taiko_map() -> Self {
            Self {
                beatmaps: Ok(vec![RawBeatmap {
                    beatmap_id: 100,
                    beatmapset_id: 10,
                    title: "Song".to_string(),
                    artist: "Artist".to_string(),
                    creator: "Mapper".to_string(),
                    bpm: 180.0,
                    total_length_secs: 150,
                    version: "Oni".to_string(),
                    mode: GameMode::Taiko,
                    star_rating: 4.5,
                    key_count: None,
                    approval_status: ApprovalStatus::Pending,
                }]),
            }
        }

        fn failing() -> Self {
            Self {
                beatmaps: Err(AppError::NotFound("mapset 10".to_string())),
            }
        }
    }

    #[async_trait]
    impl BeatmapProvider for StubProvider {
        async fn beatmaps_by_mapset(&self, _mapset_id: i64) -> AppResult<Vec<RawBeatmap>> {
            match &self.beatmaps {
                Ok(beatmaps) => Ok(beatmaps.clone()),
                Err(e) => Err(AppError::NotFound(e.to_string())),
            }
        }

        async fn beatmap_by_id(&self, _map_id: i64) -> AppResult<Option<RawBeatmap>> {
            Ok(self
                .beatmaps
                .as_ref()
                .ok()
                .and_then(|b| b.first().cloned()))
        }

        async fn user_by_osu_id(&self, _osu_id: i64) -> AppResult<RawOsuUser> {
            Err(AppError::Internal("not used".to_string()))
        }
    }

    fn service_with(db: DatabaseConnection, provider: StubProvider) -> RequestService {
        let db = Arc::new(db);
        RequestService::new(
            RequestRepository::new(db.clone()),
            QueueRepository::new(db.clone()),
            UserRepository::new(db),
            Arc::new(provider),
        )
    }

    fn test_owner() -> user::Model {
        user::Model {
            id: "owner".to_string(),
            osu_id: 5,
            username: "Owner".to_string(),
            username_lower: "owner".to_string(),
            country_code: "US".to_string(),
            avatar_url: None,
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_queue(open: bool, max_pending: Option<i32>) -> queue::Model {
        queue::Model {
            id: "q1".to_string(),
            owner_id: "owner".to_string(),
            open,
            archived: false,
            max_pending,
            cooldown: 0,
            accept_m4m: false,
            modder_type: ModderType::Modder,
            modes: json!(["Taiko"]),
            title: None,
            notes: None,
            last_actioned_at: Utc::now().into(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_request(id: &str, requester_id: &str) -> request::Model {
        request::Model {
            id: id.to_string(),
            requester_id: requester_id.to_string(),
            target_id: "owner".to_string(),
            request_date: Utc::now().into(),
            map_id: 100,
            mapset_id: Some(10),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            creator: "Mapper".to_string(),
            bpm: 180.0,
            length: "2:30".to_string(),
            diffs: json!([]),
            approval_status: ApprovalStatus::Pending,
            image_url: String::new(),
            comment: String::new(),
            m4m: false,
            status: RequestStatus::Pending,
            feedback: None,
            archived: false,
        }
    }

    #[tokio::test]
    async fn test_submit_invalid_beatmap_identifier() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db, StubProvider::failing());

        let outcome = service
            .submit("u1", "owner", 10, String::new(), false)
            .await
            .unwrap();
        assert!(outcome.map.is_none());
        assert!(outcome.request.is_none());
        assert_eq!(outcome.errors, vec!["Invalid beatmap identifier"]);
    }

    #[tokio::test]
    async fn test_submit_closed_queue_is_not_persisted() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_owner()]])
            .append_query_results([[test_queue(false, Some(5))]])
            .append_query_results([Vec::<request::Model>::new()])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let outcome = service
            .submit("u1", "owner", 10, String::new(), false)
            .await
            .unwrap();

        assert!(outcome.map.is_some());
        assert!(outcome.request.is_none());
        assert_eq!(outcome.errors, vec!["Requests are closed"]);
    }

    #[tokio::test]
    async fn test_submit_persists_pending_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_owner()]])
            .append_query_results([[test_queue(true, Some(5))]])
            .append_query_results([Vec::<request::Model>::new()])
            .append_query_results([[test_request("r1", "u1")]])
            .append_query_results([[btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1))
            }]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let outcome = service
            .submit("u1", "owner", 10, "please mod".to_string(), false)
            .await
            .unwrap();

        assert!(outcome.errors.is_empty());
        let request = outcome.request.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_owner_bypasses_closed_queue() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_owner()]])
            .append_query_results([[test_queue(false, None)]])
            .append_query_results([Vec::<request::Model>::new()])
            .append_query_results([[test_request("r1", "owner")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let outcome = service
            .submit("owner", "owner", 10, String::new(), false)
            .await
            .unwrap();

        assert!(outcome.errors.is_empty());
        assert!(outcome.request.is_some());
    }

    #[tokio::test]
    async fn test_submit_at_capacity_closes_queue() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_owner()]])
            .append_query_results([[test_queue(true, Some(1))]])
            .append_query_results([Vec::<request::Model>::new()])
            .append_query_results([[test_request("r1", "u1")]])
            .append_query_results([[btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1))
            }]])
            .append_query_results([[test_queue(false, Some(1))]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let db = Arc::new(db);
        let service = RequestService::new(
            RequestRepository::new(db.clone()),
            QueueRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            Arc::new(StubProvider::with_taiko_map()),
        );

        let outcome = service
            .submit("u1", "owner", 10, String::new(), false)
            .await
            .unwrap();
        assert!(outcome.errors.is_empty());
        assert!(outcome.request.is_some());

        drop(service);
        let Ok(db) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = format!("{:?}", db.into_transaction_log());
        assert!(
            log.contains(r#"UPDATE \"queue\" SET \"open\""#),
            "no UPDATE closing the queue in: {log}"
        );
        assert!(log.contains("Bool(Some(false))"));
    }

    #[tokio::test]
    async fn test_edit_requires_queue_owner() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_request("r1", "u1")]])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let result = service
            .edit("r1", "intruder", EditRequestInput::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_edit_rejects_out_of_vocabulary_status() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_request("r1", "u1")]])
            .append_query_results([[test_queue(true, None)]])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        // Nominated belongs to nominator queues; this one is a plain modder.
        let result = service
            .edit(
                "r1",
                "owner",
                EditRequestInput {
                    status: Some(RequestStatus::Nominated),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_edit_updates_status_and_stamps_queue() {
        let mut edited = test_request("r1", "u1");
        edited.status = RequestStatus::Accepted;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_request("r1", "u1")]])
            .append_query_results([[test_queue(true, None)]])
            .append_query_results([[edited]])
            .append_query_results([[test_queue(true, None)]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let updated = service
            .edit(
                "r1",
                "owner",
                EditRequestInput {
                    status: Some(RequestStatus::Accepted),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Accepted);
    }

    #[tokio::test]
    async fn test_edit_succeeds_for_owner_of_archived_queue() {
        // The sweep archives queues that still hold live requests; the
        // owner keeps editing rights over them.
        let mut archived_queue = test_queue(false, None);
        archived_queue.archived = true;

        let mut edited = test_request("r1", "u1");
        edited.status = RequestStatus::Rejected;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_request("r1", "u1")]])
            .append_query_results([[archived_queue.clone()]])
            .append_query_results([[edited]])
            .append_query_results([[archived_queue]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let updated = service
            .edit(
                "r1",
                "owner",
                EditRequestInput {
                    status: Some(RequestStatus::Rejected),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Rejected);
    }

    #[tokio::test]
    async fn test_delete_by_third_party_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_request("r1", "u1")]])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let result = service.delete("r1", "intruder").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_by_requester() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_request("r1", "u1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        assert!(service.delete("r1", "u1").await.is_ok());
    }

    #[tokio::test]
    async fn test_archive_batch_returns_modified_count() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_queue(true, None)]])
            .append_query_results([[test_queue(true, None)]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let modified = service
            .archive_batch(
                "owner",
                ArchiveBatchInput {
                    status: Some(RequestStatus::Rejected),
                    age: Some(30),
                },
            )
            .await
            .unwrap();
        assert_eq!(modified, 3);
    }

    #[tokio::test]
    async fn test_archive_batch_works_on_archived_queue() {
        let mut archived_queue = test_queue(false, None);
        archived_queue.archived = true;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[archived_queue.clone()]])
            .append_query_results([[archived_queue]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let modified = service
            .archive_batch(
                "owner",
                ArchiveBatchInput {
                    status: None,
                    age: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(modified, 2);
    }

    #[tokio::test]
    async fn test_refresh_recovers_missing_mapset_id() {
        let mut legacy = test_request("r1", "u1");
        legacy.mapset_id = None;

        let mut refreshed = test_request("r1", "u1");
        refreshed.mapset_id = Some(10);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[legacy]])
            .append_query_results([[refreshed]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = service_with(db, StubProvider::with_taiko_map());
        let updated = service.refresh("r1", "owner").await.unwrap();
        assert_eq!(updated.mapset_id, Some(10));
    }
}
