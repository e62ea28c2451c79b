//! High-level data access over the database. SQL and query building stay
//! behind these functions so the rest of the crate works with domain
//! models only.

pub mod monitor_service;

pub use monitor_service::*;
