//! Periodic queue maintenance.
//!
//! The sweep walks every non-archived queue once per interval and
//! applies three rules: stale open queues are closed, abandoned or dead
//! queues are archived. The rules are pure predicates over a
//! [`QueueActivitySnapshot`] so they can be adjusted and tested without
//! touching the sweep's control flow. Each queue is evaluated in
//! isolation; one failure never aborts the rest of the sweep.

use chrono::{DateTime, Duration, TimeZone, Utc};
use osumod_common::{config::MaintenanceConfig, AppResult};
use osumod_db::entities::queue;
use osumod_db::repositories::{QueueRepository, RequestRepository};
use sea_orm::Set;

/// Fallback activity date for rows that predate activity tracking.
fn activity_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 4, 17, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Derived activity facts for one queue.
#[derive(Debug, Clone)]
pub struct QueueActivitySnapshot {
    /// Last owner action on the queue itself, when known.
    pub last_active: Option<DateTime<Utc>>,
    /// Submission time of the newest request, if any exist.
    pub newest_request: Option<DateTime<Utc>>,
    /// Submission time of the newest request the owner has acted on.
    pub latest_actioned_request: Option<DateTime<Utc>>,
    /// Total requests ever submitted to the queue.
    pub request_count: u64,
    /// Creation or most recent reactivation time.
    pub reactivated_at: DateTime<Utc>,
}

impl QueueActivitySnapshot {
    /// Whether the owner has ever acted on any request.
    #[must_use]
    pub fn has_ever_actioned(&self) -> bool {
        self.latest_actioned_request.is_some()
    }

    fn effective_last_active(&self) -> DateTime<Utc> {
        self.last_active.unwrap_or_else(activity_epoch)
    }
}

/// An open queue whose owner has not acted for too long gets closed.
#[must_use]
pub fn should_auto_close(
    open: bool,
    snapshot: &QueueActivitySnapshot,
    auto_close_days: i64,
    now: DateTime<Utc>,
) -> bool {
    open && now - snapshot.effective_last_active() > Duration::days(auto_close_days)
}

/// An open queue is abandoned when the owner has never acted on any of
/// its requests, or their last actioned request went stale while newer
/// requests kept arriving. A queue whose single newest request is the
/// stale actioned one is spared.
#[must_use]
pub fn is_abandoned(
    open: bool,
    snapshot: &QueueActivitySnapshot,
    no_response_days: i64,
    now: DateTime<Utc>,
) -> bool {
    if !open {
        return false;
    }

    match snapshot.latest_actioned_request {
        None => snapshot.request_count > 0,
        Some(actioned) => {
            let stale = now - actioned > Duration::days(no_response_days);
            let newer_requests_exist = snapshot
                .newest_request
                .is_some_and(|newest| newest > actioned);
            stale && newer_requests_exist
        }
    }
}

/// A queue is dead when nothing has been submitted to it for a long
/// time. Queues that never received a request are not considered dead.
#[must_use]
pub fn is_dead(snapshot: &QueueActivitySnapshot, dead_days: i64, now: DateTime<Utc>) -> bool {
    snapshot
        .newest_request
        .is_some_and(|newest| now - newest > Duration::days(dead_days))
}

/// Freshly created or reactivated queues are spared from archival.
#[must_use]
pub fn within_leniency(
    snapshot: &QueueActivitySnapshot,
    leniency_days: i64,
    now: DateTime<Utc>,
) -> bool {
    now - snapshot.reactivated_at <= Duration::days(leniency_days)
}

/// Counts of what one sweep changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub closed: u64,
    pub archived: u64,
    pub failed: u64,
}

#[derive(Clone)]
pub struct MaintenanceService {
    queue_repo: QueueRepository,
    request_repo: RequestRepository,
    config: MaintenanceConfig,
}

impl MaintenanceService {
    #[must_use]
    pub const fn new(
        queue_repo: QueueRepository,
        request_repo: RequestRepository,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            queue_repo,
            request_repo,
            config,
        }
    }

    /// Run one maintenance sweep over every non-archived queue.
    ///
    /// Idempotent: each rule gates on the `open`/`archived` flags it
    /// clears, so a second run with no intervening writes changes
    /// nothing.
    pub async fn sweep(&self) -> AppResult<SweepSummary> {
        let queues = self.queue_repo.list_non_archived().await?;
        let now = Utc::now();
        let mut summary = SweepSummary::default();

        for queue in queues {
            let queue_id = queue.id.clone();
            match self.evaluate_queue(queue, now).await {
                Ok(Outcome::Archived) => summary.archived += 1,
                Ok(Outcome::Closed) => summary.closed += 1,
                Ok(Outcome::Untouched) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(queue_id = %queue_id, error = %e, "queue sweep failed");
                }
            }
        }

        tracing::info!(
            closed = summary.closed,
            archived = summary.archived,
            failed = summary.failed,
            "maintenance sweep finished"
        );
        Ok(summary)
    }

    async fn evaluate_queue(&self, queue: queue::Model, now: DateTime<Utc>) -> AppResult<Outcome> {
        let snapshot = self.snapshot(&queue).await?;

        let expired =
            (is_abandoned(queue.open, &snapshot, self.config.no_response_days, now)
                || is_dead(&snapshot, self.config.dead_days, now))
                && !within_leniency(&snapshot, self.config.leniency_days, now);

        if expired {
            tracing::info!(queue_id = %queue.id, "archiving inactive queue");
            let mut active: queue::ActiveModel = queue.into();
            active.archived = Set(true);
            active.open = Set(false);
            active.updated_at = Set(Some(now.into()));
            self.queue_repo.update(active).await?;
            return Ok(Outcome::Archived);
        }

        if should_auto_close(queue.open, &snapshot, self.config.auto_close_days, now) {
            tracing::info!(queue_id = %queue.id, "closing stale queue");
            let mut active: queue::ActiveModel = queue.into();
            active.open = Set(false);
            active.updated_at = Set(Some(now.into()));
            self.queue_repo.update(active).await?;
            return Ok(Outcome::Closed);
        }

        Ok(Outcome::Untouched)
    }

    async fn snapshot(&self, queue: &queue::Model) -> AppResult<QueueActivitySnapshot> {
        let request_count = self.request_repo.count_by_target(&queue.owner_id).await?;
        let newest_request = self
            .request_repo
            .find_newest_by_target(&queue.owner_id)
            .await?
            .map(|r| r.request_date.with_timezone(&Utc));
        let latest_actioned_request = self
            .request_repo
            .find_latest_actioned_by_target(&queue.owner_id)
            .await?
            .map(|r| r.request_date.with_timezone(&Utc));

        Ok(QueueActivitySnapshot {
            last_active: Some(queue.last_actioned_at.with_timezone(&Utc)),
            newest_request,
            latest_actioned_request,
            request_count,
            reactivated_at: queue.created_at.with_timezone(&Utc),
        })
    }
}

enum Outcome {
    Archived,
    Closed,
    Untouched,
}
