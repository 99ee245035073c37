//! Database repositories.

mod queue;
mod request;
mod user;

pub use queue::QueueRepository;
pub use request::{ArchiveBatchFilter, RequestRepository};
pub use user::UserRepository;
