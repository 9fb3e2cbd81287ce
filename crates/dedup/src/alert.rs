//! Duplicate alert record and its triage lifecycle.
//!
//! ```text
//! Open --resolve--> Resolved   (terminal)
//! Open --ignore---> Ignored    (terminal)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mixerp_core::{AlertId, DomainError, DomainResult, EntityId};

use crate::entity::{DedupField, EntityKind};
use crate::grouping::CandidatePair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Resolved,
    Ignored,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Ignored => "ignored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AlertStatus::Open)
    }
}

impl core::str::FromStr for AlertStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(AlertStatus::Open),
            "resolved" => Ok(AlertStatus::Resolved),
            "ignored" => Ok(AlertStatus::Ignored),
            other => Err(DomainError::validation(format!(
                "status must be one of: open, resolved, ignored (got '{other}')"
            ))),
        }
    }
}

impl core::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted flag that two records probably describe the same real-world thing.
///
/// # Invariants
/// - `entity_a < entity_b` (the pair is unordered and stored canonically).
/// - `(entity_kind, field, entity_a, entity_b)` identifies at most one alert.
/// - `resolved_by`/`resolved_at` are set exactly when the status is terminal, and are
///   never overwritten afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateAlert {
    pub id: AlertId,
    pub entity_kind: EntityKind,
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub field: DedupField,
    pub matched_value: String,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Uniqueness key of an alert: kind, field and the canonical pair.
pub type AlertKey = (EntityKind, DedupField, EntityId, EntityId);

impl DuplicateAlert {
    /// New alert in the `Open` state for a detected pair.
    pub fn open(pair: CandidatePair, created_at: DateTime<Utc>) -> Self {
        Self {
            id: AlertId::new(),
            entity_kind: pair.kind,
            entity_a: pair.entity_a,
            entity_b: pair.entity_b,
            field: pair.field,
            matched_value: pair.matched_value,
            status: AlertStatus::Open,
            created_at,
            resolved_by: None,
            resolved_at: None,
        }
    }

    pub fn key(&self) -> AlertKey {
        (
            self.entity_kind,
            self.field,
            self.entity_a.clone(),
            self.entity_b.clone(),
        )
    }

    pub fn resolve(&mut self, actor: &str, at: DateTime<Utc>) -> DomainResult<()> {
        self.close(AlertStatus::Resolved, actor, at)
    }

    pub fn ignore(&mut self, actor: &str, at: DateTime<Utc>) -> DomainResult<()> {
        self.close(AlertStatus::Ignored, actor, at)
    }

    /// Terminal transition. Fails without touching the alert if it is already closed.
    fn close(&mut self, to: AlertStatus, actor: &str, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_state(format!(
                "alert {} is already {}",
                self.id, self.status
            )));
        }
        if actor.trim().is_empty() {
            return Err(DomainError::validation("actor display name must not be empty"));
        }

        self.status = to;
        self.resolved_by = Some(actor.to_string());
        self.resolved_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_alert() -> DuplicateAlert {
        let pair = CandidatePair::new(
            EntityKind::Client,
            DedupField::Email,
            EntityId::new("c9"),
            EntityId::new("c2"),
            "Sales@Acme.co",
        )
        .unwrap();
        DuplicateAlert::open(pair, Utc::now())
    }

    #[test]
    fn open_alert_has_canonical_pair_and_no_provenance() {
        let alert = test_alert();
        assert_eq!(alert.status, AlertStatus::Open);
        assert_eq!(alert.entity_a.as_str(), "c2");
        assert_eq!(alert.entity_b.as_str(), "c9");
        assert!(alert.resolved_by.is_none());
        assert!(alert.resolved_at.is_none());
    }

    #[test]
    fn resolve_stamps_actor_and_time() {
        let mut alert = test_alert();
        let at = Utc::now();
        alert.resolve("Jane Manager", at).unwrap();
        assert_eq!(alert.status, AlertStatus::Resolved);
        assert_eq!(alert.resolved_by.as_deref(), Some("Jane Manager"));
        assert_eq!(alert.resolved_at, Some(at));
    }

    #[test]
    fn terminal_alert_rejects_further_transitions_and_keeps_provenance() {
        let mut alert = test_alert();
        let first = Utc::now();
        alert.ignore("Ops", first).unwrap();

        let before = alert.clone();
        let later = first + Duration::minutes(5);

        let err = alert.resolve("Someone Else", later).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        let err = alert.ignore("Someone Else", later).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        assert_eq!(alert, before);
    }

    #[test]
    fn blank_actor_is_rejected() {
        let mut alert = test_alert();
        let err = alert.resolve("  ", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(alert.status, AlertStatus::Open);
    }

    #[test]
    fn alert_serializes_with_wire_names() {
        let json = serde_json::to_value(test_alert()).unwrap();
        assert_eq!(json["status"], "open");
        assert_eq!(json["entity_kind"], "client");
        assert_eq!(json["field"], "email");
        assert_eq!(json["matched_value"], "Sales@Acme.co");
        assert!(json["resolved_by"].is_null());
    }

    #[test]
    fn status_parses_wire_names() {
        assert_eq!("ignored".parse::<AlertStatus>().unwrap(), AlertStatus::Ignored);
        assert!("closed".parse::<AlertStatus>().is_err());
    }
}
