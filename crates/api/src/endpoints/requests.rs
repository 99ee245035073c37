//! Request endpoints.

use axum::{
    extract::{Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use osumod_common::AppResult;
use osumod_core::services::request::{
    ArchiveBatchInput, EditRequestInput, RequestResponse, SubmitOutcome,
};
use osumod_db::entities::request::RequestStatus;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create request router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(submit_request))
        .route("/request", delete(delete_request))
        .route("/requests", get(list_requests))
        .route("/my-requests", get(list_my_requests))
        .route("/request-edit", post(edit_request))
        .route("/request-refresh", post(refresh_request))
        .route("/archive-batch", post(archive_batch))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequestBody {
    /// Beatmapset id to submit.
    pub map_id: i64,
    /// Target queue owner, by display name or osu! id.
    pub target: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub m4m: bool,
}

/// Submit a mapset to a queue.
async fn submit_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<SubmitRequestBody>,
) -> AppResult<ApiResponse<SubmitOutcome>> {
    let outcome = state
        .request_service
        .submit(&user.id, &body.target, body.map_id, body.comment, body.m4m)
        .await?;
    Ok(ApiResponse::ok(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsQuery {
    pub target: String,
    #[serde(default)]
    pub archived: bool,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestListResponse {
    pub requests: Vec<RequestResponse>,
    /// Cursor for the next page; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl RequestListResponse {
    fn from_page(page: Vec<osumod_db::entities::request::Model>, page_size: u64) -> Self {
        let next_cursor = if page.len() as u64 == page_size {
            page.last().map(|r| r.id.clone())
        } else {
            None
        };
        Self {
            requests: page.into_iter().map(Into::into).collect(),
            next_cursor,
        }
    }
}

/// Page of requests for a target queue, newest first.
async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> AppResult<ApiResponse<RequestListResponse>> {
    let page = state
        .request_service
        .page_for_target(&query.target, query.archived, query.cursor.as_deref())
        .await?;
    Ok(ApiResponse::ok(RequestListResponse::from_page(
        page,
        osumod_core::services::request::PAGE_SIZE,
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRequestsQuery {
    pub cursor: Option<String>,
}

/// Page of the caller's own outbound requests.
async fn list_my_requests(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<MyRequestsQuery>,
) -> AppResult<ApiResponse<RequestListResponse>> {
    let page = state
        .request_service
        .page_for_requester(&user.id, query.cursor.as_deref())
        .await?;
    Ok(ApiResponse::ok(RequestListResponse::from_page(
        page,
        osumod_core::services::request::PAGE_SIZE,
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdBody {
    pub id: String,
}

/// Delete a request; allowed for the requester and the queue owner.
async fn delete_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<RequestIdBody>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.request_service.delete(&body.id, &user.id).await?;
    Ok(crate::response::ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequestBody {
    pub id: String,
    pub status: Option<RequestStatus>,
    pub feedback: Option<String>,
    pub archived: Option<bool>,
}

/// Owner edit of status, feedback or archival.
async fn edit_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<EditRequestBody>,
) -> AppResult<ApiResponse<RequestResponse>> {
    let updated = state
        .request_service
        .edit(
            &body.id,
            &user.id,
            EditRequestInput {
                status: body.status,
                feedback: body.feedback,
                archived: body.archived,
            },
        )
        .await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Re-pull the map snapshot from the osu! API.
async fn refresh_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<RequestIdBody>,
) -> AppResult<ApiResponse<RequestResponse>> {
    let updated = state.request_service.refresh(&body.id, &user.id).await?;
    Ok(ApiResponse::ok(updated.into()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveBatchResponse {
    pub modified_count: u64,
}

/// Bulk-archive the caller's requests matching an optional filter.
async fn archive_batch(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<ArchiveBatchInput>,
) -> AppResult<ApiResponse<ArchiveBatchResponse>> {
    let modified_count = state.request_service.archive_batch(&user.id, body).await?;
    Ok(ApiResponse::ok(ArchiveBatchResponse { modified_count }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use osumod_db::entities::request::{self, ApprovalStatus, RequestStatus};
    use serde_json::json;

    fn request_row(id: &str, request_date: chrono::DateTime<chrono::FixedOffset>) -> request::Model {
        request::Model {
            id: id.to_string(),
            requester_id: "u1".to_string(),
            target_id: "owner".to_string(),
            request_date,
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

    #[test]
    fn test_from_page_short_page_has_no_cursor() {
        let now = Utc::now().fixed_offset();
        let response = RequestListResponse::from_page(vec![request_row("r2", now)], 2);
        assert_eq!(response.requests.len(), 1);
        assert!(response.next_cursor.is_none());
    }

    #[test]
    fn test_from_page_cursor_is_last_id_even_on_timestamp_ties() {
        // Two rows sharing a request_date; the id keyset keeps paging
        // deterministic where a timestamp cursor would skip the twin.
        let now = Utc::now().fixed_offset();
        let page = vec![request_row("r2", now), request_row("r1", now)];

        let response = RequestListResponse::from_page(page, 2);
        assert_eq!(response.next_cursor.as_deref(), Some("r1"));
    }
}
