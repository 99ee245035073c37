//! Periodic job scheduling for osumod.

pub mod scheduler;

pub use scheduler::{run_scheduler, JobExecutor, MaintenanceExecutor, SchedulerConfig};
