//! `mixerp-dedup`
//!
//! **Responsibility:** duplicate-record detection and the alert triage lifecycle.
//!
//! This crate is pure and storage-agnostic:
//! - Inputs are entity snapshots supplied by callers (infra/workers).
//! - Grouping is a deterministic function of its input.
//! - Alerts are plain values; persisting them is the caller's job.

pub mod alert;
pub mod entity;
pub mod grouping;

pub use alert::{AlertKey, AlertStatus, DuplicateAlert};
pub use entity::{
    ClientRecord, ClientStatus, DedupCandidate, DedupField, EntityKind, InventoryItemRecord,
    MatchRule, StaffRecord, StaffStatus,
};
pub use grouping::{CandidatePair, DuplicateGroup, candidate_pairs, detect, group_duplicates, normalize};
