//! Queue repository.

use std::sync::Arc;

use crate::entities::{queue, Queue};
use osumod_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Queue repository for database operations.
#[derive(Clone)]
pub struct QueueRepository {
    db: Arc<DatabaseConnection>,
}

impl QueueRepository {
    /// Create a new queue repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a queue by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<queue::Model>> {
        Queue::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the owner's queue regardless of archival state.
    ///
    /// There is at most one row per owner; archival is a soft flag.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Option<queue::Model>> {
        Queue::find()
            .filter(queue::Column::OwnerId.eq(owner_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the owner's non-archived queue.
    pub async fn find_active_by_owner(&self, owner_id: &str) -> AppResult<Option<queue::Model>> {
        Queue::find()
            .filter(queue::Column::OwnerId.eq(owner_id))
            .filter(queue::Column::Archived.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the owner's non-archived queue, returning an error if absent.
    pub async fn get_active_by_owner(&self, owner_id: &str) -> AppResult<queue::Model> {
        self.find_active_by_owner(owner_id)
            .await?
            .ok_or_else(|| AppError::QueueNotFound(owner_id.to_string()))
    }

    /// All non-archived queues, most recently actioned first.
    pub async fn list_non_archived(&self) -> AppResult<Vec<queue::Model>> {
        Queue::find()
            .filter(queue::Column::Archived.eq(false))
            .order_by_desc(queue::Column::LastActionedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new queue.
    pub async fn create(&self, model: queue::ActiveModel) -> AppResult<queue::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a queue.
    pub async fn update(&self, model: queue::ActiveModel) -> AppResult<queue::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
