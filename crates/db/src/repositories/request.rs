//! Request repository.

use std::sync::Arc;

use crate::entities::{
    request::{self, RequestStatus},
    Request,
};
use osumod_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Filter for bulk archival of an owner's requests.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBatchFilter {
    /// Only archive requests with this status.
    pub status: Option<RequestStatus>,
    /// Only archive requests submitted before this instant.
    pub before: Option<sea_orm::prelude::DateTimeWithTimeZone>,
}

/// Condition matching requests the owner has acted on in any way.
fn actioned_condition() -> Condition {
    Condition::any()
        .add(request::Column::Status.ne(RequestStatus::Pending))
        .add(request::Column::Archived.eq(true))
        .add(
            Condition::all()
                .add(request::Column::Feedback.is_not_null())
                .add(request::Column::Feedback.ne("")),
        )
}

/// Request repository for database operations.
#[derive(Clone)]
pub struct RequestRepository {
    db: Arc<DatabaseConnection>,
}

impl RequestRepository {
    /// Create a new request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<request::Model>> {
        Request::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a request by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<request::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::RequestNotFound(id.to_string()))
    }

    /// A page of requests for a target queue, newest first.
    ///
    /// `cursor` is the id of the last item of the previous page. Ids
    /// are ULIDs, so id order is creation order and the keyset cannot
    /// skip rows that share a `request_date`.
    pub async fn page_by_target(
        &self,
        target_id: &str,
        archived: bool,
        cursor: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<request::Model>> {
        let mut query = Request::find()
            .filter(request::Column::TargetId.eq(target_id))
            .filter(request::Column::Archived.eq(archived));

        if let Some(cursor) = cursor {
            query = query.filter(request::Column::Id.lt(cursor));
        }

        query
            .order_by_desc(request::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A page of a requester's own outbound requests, newest first.
    pub async fn page_by_requester(
        &self,
        requester_id: &str,
        cursor: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<request::Model>> {
        let mut query = Request::find().filter(request::Column::RequesterId.eq(requester_id));

        if let Some(cursor) = cursor {
            query = query.filter(request::Column::Id.lt(cursor));
        }

        query
            .order_by_desc(request::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The requester's most recent prior request to this target, if any.
    pub async fn find_latest_by_requester_and_target(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> AppResult<Option<request::Model>> {
        Request::find()
            .filter(request::Column::RequesterId.eq(requester_id))
            .filter(request::Column::TargetId.eq(target_id))
            .order_by_desc(request::Column::RequestDate)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count of non-archived Pending requests for a target. Drives the
    /// capacity auto-close.
    pub async fn count_pending_by_target(&self, target_id: &str) -> AppResult<u64> {
        Request::find()
            .filter(request::Column::TargetId.eq(target_id))
            .filter(request::Column::Archived.eq(false))
            .filter(request::Column::Status.eq(RequestStatus::Pending))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Total number of requests ever submitted to a target.
    pub async fn count_by_target(&self, target_id: &str) -> AppResult<u64> {
        Request::find()
            .filter(request::Column::TargetId.eq(target_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The most recently submitted request for a target, if any.
    pub async fn find_newest_by_target(&self, target_id: &str) -> AppResult<Option<request::Model>> {
        Request::find()
            .filter(request::Column::TargetId.eq(target_id))
            .order_by_desc(request::Column::RequestDate)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The newest request the owner has acted on (status change, feedback,
    /// or archival), if any.
    pub async fn find_latest_actioned_by_target(
        &self,
        target_id: &str,
    ) -> AppResult<Option<request::Model>> {
        Request::find()
            .filter(request::Column::TargetId.eq(target_id))
            .filter(actioned_condition())
            .order_by_desc(request::Column::RequestDate)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new request.
    pub async fn create(&self, model: request::ActiveModel) -> AppResult<request::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a request.
    pub async fn update(&self, model: request::ActiveModel) -> AppResult<request::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a request.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Request::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Bulk-archive the owner's non-archived requests matching the filter.
    /// Returns the number of rows modified; 0 means nothing matched.
    pub async fn archive_matching(
        &self,
        target_id: &str,
        filter: &ArchiveBatchFilter,
    ) -> AppResult<u64> {
        let mut update = Request::update_many()
            .col_expr(request::Column::Archived, Expr::value(true))
            .filter(request::Column::TargetId.eq(target_id))
            .filter(request::Column::Archived.eq(false));

        if let Some(status) = filter.status {
            update = update.filter(request::Column::Status.eq(status));
        }
        if let Some(before) = filter.before {
            update = update.filter(request::Column::RequestDate.lt(before));
        }

        let result = update
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
