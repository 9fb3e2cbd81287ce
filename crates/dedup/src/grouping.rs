//! Pure grouping of records by normalized field value.
//!
//! Model:
//! - Derive a comparison key per record and field (see [`normalize`]).
//! - Records sharing a key form a [`DuplicateGroup`] (two or more members).
//! - Every unordered pair inside a group becomes a [`CandidatePair`].
//!
//! Nothing here touches storage; diffing against existing alerts is done by the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mixerp_core::{Entity, EntityId};

use crate::entity::{DedupCandidate, DedupField, EntityKind, MatchRule};

/// Comparison key for `value` under `rule`; `None` for blank values.
///
/// Blank (empty or whitespace-only) values never take part in grouping, otherwise every
/// record with a missing phone would be flagged as a duplicate of every other.
pub fn normalize(rule: MatchRule, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return None;
    }
    match rule {
        MatchRule::CaseInsensitive => Some(value.to_lowercase()),
        MatchRule::Exact => Some(value.to_string()),
    }
}

/// Records of one kind sharing a normalized key for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub kind: EntityKind,
    pub field: DedupField,
    pub key: String,
    /// Original value of the first member (input order), for display.
    pub display_value: String,
    /// Distinct member ids in input order; always two or more.
    pub members: Vec<EntityId>,
}

/// An unordered pair of likely duplicates, stored canonically (`entity_a < entity_b`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    pub kind: EntityKind,
    pub field: DedupField,
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub matched_value: String,
}

impl CandidatePair {
    /// Build a pair in canonical order. Returns `None` when both ids are the same.
    pub fn new(
        kind: EntityKind,
        field: DedupField,
        x: EntityId,
        y: EntityId,
        matched_value: impl Into<String>,
    ) -> Option<Self> {
        let (entity_a, entity_b) = match x.cmp(&y) {
            core::cmp::Ordering::Less => (x, y),
            core::cmp::Ordering::Greater => (y, x),
            core::cmp::Ordering::Equal => return None,
        };
        Some(Self {
            kind,
            field,
            entity_a,
            entity_b,
            matched_value: matched_value.into(),
        })
    }
}

/// Group `records` by the normalized value of `field`.
///
/// Output is deterministic: groups are ordered by key, members keep input order.
/// Records repeated in the input are counted once.
pub fn group_duplicates<'a, R, I>(field: DedupField, records: I) -> Vec<DuplicateGroup>
where
    R: DedupCandidate + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let rule = field.match_rule();
    let mut by_key: BTreeMap<String, (String, Vec<EntityId>)> = BTreeMap::new();

    for record in records {
        let Some(raw) = record.field_value(field) else {
            continue;
        };
        let Some(key) = normalize(rule, raw) else {
            continue;
        };

        let (_, members) = by_key
            .entry(key)
            .or_insert_with(|| (raw.to_string(), Vec::new()));
        if !members.contains(record.id()) {
            members.push(record.id().clone());
        }
    }

    by_key
        .into_iter()
        .filter(|(_, (_, members))| members.len() >= 2)
        .map(|(key, (display_value, members))| DuplicateGroup {
            kind: R::KIND,
            field,
            key,
            display_value,
            members,
        })
        .collect()
}

/// Expand groups into every unordered member pair.
pub fn candidate_pairs(groups: &[DuplicateGroup]) -> Vec<CandidatePair> {
    let mut pairs = Vec::new();
    for group in groups {
        for (i, x) in group.members.iter().enumerate() {
            for y in &group.members[i + 1..] {
                if let Some(pair) = CandidatePair::new(
                    group.kind,
                    group.field,
                    x.clone(),
                    y.clone(),
                    group.display_value.clone(),
                ) {
                    pairs.push(pair);
                }
            }
        }
    }
    pairs
}

/// Full detection pass for one entity kind: drop excluded records, then group on every
/// scanned field of the kind.
pub fn detect<R: DedupCandidate>(records: &[R]) -> Vec<CandidatePair> {
    let eligible: Vec<&R> = records.iter().filter(|r| !r.is_excluded()).collect();

    R::KIND
        .fields()
        .iter()
        .flat_map(|field| candidate_pairs(&group_duplicates(*field, eligible.iter().copied())))
        .collect()
}
