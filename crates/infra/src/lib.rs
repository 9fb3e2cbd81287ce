//! Infrastructure layer: stores, services, background runners and configuration.

pub mod config;
pub mod dedup;
