//! Upstream forum access.

mod client;
pub mod query;

pub use client::{Credentials, ForumClient};
