//! Service layer.

pub mod admission;
pub mod auth;
pub mod maintenance;
pub mod osu;
pub mod queue;
pub mod request;
pub mod user;
