//! Business logic for the osumod request queue.
//!
//! Services in this crate sit between the HTTP layer and the
//! repositories: map metadata resolution, request admission, the
//! request lifecycle, queue settings, and the periodic maintenance
//! sweep.

pub mod services;

pub use services::admission;
pub use services::auth::OsuAuthService;
pub use services::maintenance::MaintenanceService;
pub use services::osu::{BeatmapProvider, MapDescriptor, OsuApiClient};
pub use services::queue::QueueService;
pub use services::request::RequestService;
pub use services::user::UserService;
