//! Interval loop driving the queue maintenance sweep.
//!
//! The sweep runs to completion on every tick; `tokio::time::interval`
//! ticks are not stacked, so a slow sweep simply delays the next one
//! instead of overlapping with it.

use std::sync::Arc;
use std::time::Duration;

use osumod_core::services::maintenance::{MaintenanceService, SweepSummary};
use tokio::time::interval;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between maintenance sweeps (default: daily).
    pub sweep_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(86400),
        }
    }
}

/// Job executor trait for scheduled jobs.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Run one maintenance sweep over all queues.
    async fn run_maintenance_sweep(
        &self,
    ) -> Result<SweepSummary, Box<dyn std::error::Error + Send + Sync>>;
}

/// Production executor backed by the maintenance service.
pub struct MaintenanceExecutor {
    maintenance: MaintenanceService,
}

impl MaintenanceExecutor {
    #[must_use]
    pub const fn new(maintenance: MaintenanceService) -> Self {
        Self { maintenance }
    }
}

#[async_trait::async_trait]
impl JobExecutor for MaintenanceExecutor {
    async fn run_maintenance_sweep(
        &self,
    ) -> Result<SweepSummary, Box<dyn std::error::Error + Send + Sync>> {
        self.maintenance.sweep().await.map_err(Into::into)
    }
}

/// Run the scheduler with the given configuration and executor.
pub async fn run_scheduler<E: JobExecutor + 'static>(config: SchedulerConfig, executor: Arc<E>) {
    let sweep_interval = config.sweep_interval;

    tokio::spawn(async move {
        let mut interval = interval(sweep_interval);
        loop {
            interval.tick().await;
            match executor.run_maintenance_sweep().await {
                Ok(summary) => {
                    if summary.closed > 0 || summary.archived > 0 {
                        tracing::info!(
                            closed = summary.closed,
                            archived = summary.archived,
                            "Maintenance sweep applied changes"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Maintenance sweep failed");
                }
            }
        }
    });
}
