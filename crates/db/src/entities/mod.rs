//! Database entities.

pub mod queue;
pub mod request;
pub mod user;

pub use queue::Entity as Queue;
pub use request::Entity as Request;
pub use user::Entity as User;
