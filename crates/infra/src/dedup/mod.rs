//! Duplicate detection service, its stores, and the background scan runner.

pub mod postgres;
pub mod runner;
pub mod service;
pub mod store;

pub use postgres::{ALERTS_SCHEMA, PostgresDedupStore};
pub use runner::{ScanRunner, ScanRunnerHandle};
pub use service::{AlertPage, DedupError, DuplicateDetector, KindReport, REQUIRED_PERMISSION, ScanReport};
pub use store::{AlertStore, EntitySource, InMemoryAlertStore, InMemoryEntitySource, StoreError};
