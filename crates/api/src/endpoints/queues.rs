//! Queue endpoints.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use osumod_common::AppResult;
use osumod_core::services::queue::{PublicQueueResponse, QueueResponse, UpdateSettingsInput};
use osumod_core::services::user::UserResponse;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Create queue router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", post(update_settings))
        .route("/open", post(set_open))
        .route("/queues", get(list_queues))
        .route("/create-queue", post(create_queue))
        .route("/archive-queue", post(archive_queue))
        .route("/notes", post(set_notes))
        .route("/update-username", post(update_username))
        .route("/whoami", get(whoami))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsQuery {
    /// Queue owner, by display name or osu! id.
    pub owner: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub owner: UserResponse,
    /// Absent when the owner runs no active queue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueResponse>,
}

/// A queue's settings and owner identity.
///
/// An unknown owner is a 404; an owner without an active queue still
/// resolves, with `queue` absent.
async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<SettingsQuery>,
) -> AppResult<ApiResponse<SettingsResponse>> {
    let (owner, queue) = state
        .queue_service
        .get_by_owner_identifier(&query.owner)
        .await?;
    Ok(ApiResponse::ok(SettingsResponse {
        owner: owner.into(),
        queue: queue.map(Into::into),
    }))
}

/// Merge a partial settings update into the caller's queue.
async fn update_settings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsInput>,
) -> AppResult<ApiResponse<QueueResponse>> {
    let queue = state.queue_service.update_settings(&user.id, body).await?;
    Ok(ApiResponse::ok(queue.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOpenBody {
    pub open: bool,
}

/// Open or close the caller's queue.
async fn set_open(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<SetOpenBody>,
) -> AppResult<ApiResponse<QueueResponse>> {
    let queue = state.queue_service.set_open(&user.id, body.open).await?;
    Ok(ApiResponse::ok(queue.into()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueListResponse {
    pub queues: Vec<PublicQueueResponse>,
}

/// Public listing of all non-archived queues, by recency.
async fn list_queues(State(state): State<AppState>) -> AppResult<ApiResponse<QueueListResponse>> {
    let queues = state.queue_service.list_public().await?;
    Ok(ApiResponse::ok(QueueListResponse { queues }))
}

/// Create the caller's queue, or un-archive their previous one.
async fn create_queue(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<QueueResponse>> {
    let queue = state.queue_service.create_or_reactivate(&user.id).await?;
    Ok(ApiResponse::ok(queue.into()))
}

/// Hide the caller's queue from the public listing.
async fn archive_queue(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<QueueResponse>> {
    let queue = state.queue_service.archive(&user.id).await?;
    Ok(ApiResponse::ok(queue.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNotesBody {
    pub content: String,
}

/// Replace the owner notes shown on the request page.
async fn set_notes(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<SetNotesBody>,
) -> AppResult<ApiResponse<QueueResponse>> {
    let queue = state.queue_service.set_notes(&user.id, body.content).await?;
    Ok(ApiResponse::ok(queue.into()))
}

/// Re-pull the caller's display name from the osu! API.
async fn update_username(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.refresh_username(&user.id).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Current identity, or an empty object for anonymous callers.
async fn whoami(MaybeAuthUser(user): MaybeAuthUser) -> ApiResponse<UserResponse> {
    match user {
        Some(user) => ApiResponse::ok(user.into()),
        None => ApiResponse::empty(),
    }
}
