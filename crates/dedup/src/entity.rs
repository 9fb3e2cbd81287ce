//! Scanned entity kinds, their comparison fields, and the snapshot records the
//! entity store hands to the detector.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use mixerp_core::{DomainError, Entity, EntityId};

/// Entity collections that are scanned for duplicates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    InventoryItem,
    Client,
    Staff,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::InventoryItem, EntityKind::Client, EntityKind::Staff];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::InventoryItem => "inventory_item",
            EntityKind::Client => "client",
            EntityKind::Staff => "staff",
        }
    }

    /// Fields compared for this kind, in scan order.
    pub fn fields(&self) -> &'static [DedupField] {
        match self {
            EntityKind::InventoryItem => &[DedupField::Name],
            EntityKind::Client => &[DedupField::Name, DedupField::Phone, DedupField::Email],
            EntityKind::Staff => &[DedupField::Email, DedupField::Phone],
        }
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown entity kind '{s}'")))
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field that can be compared across records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupField {
    Name,
    Email,
    Phone,
}

impl DedupField {
    pub const ALL: [DedupField; 3] = [DedupField::Name, DedupField::Email, DedupField::Phone];

    pub fn as_str(&self) -> &'static str {
        match self {
            DedupField::Name => "name",
            DedupField::Email => "email",
            DedupField::Phone => "phone",
        }
    }

    pub fn match_rule(&self) -> MatchRule {
        match self {
            DedupField::Name | DedupField::Email => MatchRule::CaseInsensitive,
            DedupField::Phone => MatchRule::Exact,
        }
    }
}

impl FromStr for DedupField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DedupField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown dedup field '{s}'")))
    }
}

impl core::fmt::Display for DedupField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field value is turned into a comparison key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Unicode lower-case fold (locale independent).
    CaseInsensitive,
    /// Value compared verbatim.
    Exact,
}

/// A record that can take part in a duplicate scan.
pub trait DedupCandidate: Entity<Id = EntityId> {
    const KIND: EntityKind;

    /// Raw value of `field`, if the record has one.
    fn field_value(&self, field: DedupField) -> Option<&str>;

    /// Records in a terminal/rejected state are left out of scans.
    fn is_excluded(&self) -> bool {
        false
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inventory items
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemRecord {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

impl InventoryItemRecord {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            archived: false,
        }
    }
}

impl Entity for InventoryItemRecord {
    type Id = EntityId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl DedupCandidate for InventoryItemRecord {
    const KIND: EntityKind = EntityKind::InventoryItem;

    fn field_value(&self, field: DedupField) -> Option<&str> {
        match field {
            DedupField::Name => Some(&self.name),
            DedupField::Email | DedupField::Phone => None,
        }
    }

    fn is_excluded(&self) -> bool {
        self.archived
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clients (CRM)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Lead,
    #[default]
    Active,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: EntityId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
}

impl ClientRecord {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: None,
            email: None,
            status: ClientStatus::Active,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_status(mut self, status: ClientStatus) -> Self {
        self.status = status;
        self
    }
}

impl Entity for ClientRecord {
    type Id = EntityId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl DedupCandidate for ClientRecord {
    const KIND: EntityKind = EntityKind::Client;

    fn field_value(&self, field: DedupField) -> Option<&str> {
        match field {
            DedupField::Name => Some(&self.name),
            DedupField::Phone => self.phone.as_deref(),
            DedupField::Email => self.email.as_deref(),
        }
    }

    fn is_excluded(&self) -> bool {
        self.status == ClientStatus::Rejected
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Staff
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    #[default]
    Active,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffRecord {
    pub id: EntityId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub status: StaffStatus,
}

impl StaffRecord {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            status: StaffStatus::Active,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_status(mut self, status: StaffStatus) -> Self {
        self.status = status;
        self
    }
}

impl Entity for StaffRecord {
    type Id = EntityId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl DedupCandidate for StaffRecord {
    const KIND: EntityKind = EntityKind::Staff;

    fn field_value(&self, field: DedupField) -> Option<&str> {
        match field {
            DedupField::Email => self.email.as_deref(),
            DedupField::Phone => self.phone.as_deref(),
            // Staff names collide legitimately; they are not compared.
            DedupField::Name => None,
        }
    }

    fn is_excluded(&self) -> bool {
        self.status == StaffStatus::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanned_fields_per_kind() {
        assert_eq!(EntityKind::InventoryItem.fields(), &[DedupField::Name]);
        assert_eq!(
            EntityKind::Client.fields(),
            &[DedupField::Name, DedupField::Phone, DedupField::Email]
        );
        assert_eq!(EntityKind::Staff.fields(), &[DedupField::Email, DedupField::Phone]);
    }

    #[test]
    fn phone_is_exact_and_the_rest_fold_case() {
        assert_eq!(DedupField::Phone.match_rule(), MatchRule::Exact);
        assert_eq!(DedupField::Name.match_rule(), MatchRule::CaseInsensitive);
        assert_eq!(DedupField::Email.match_rule(), MatchRule::CaseInsensitive);
    }

    #[test]
    fn terminal_records_are_excluded() {
        assert!(ClientRecord::new("c1", "Acme").with_status(ClientStatus::Rejected).is_excluded());
        assert!(!ClientRecord::new("c1", "Acme").with_status(ClientStatus::Lead).is_excluded());
        assert!(StaffRecord::new("s1", "Ana").with_status(StaffStatus::Terminated).is_excluded());
        let mut item = InventoryItemRecord::new("i1", "Cement");
        item.archived = true;
        assert!(item.is_excluded());
    }

    #[test]
    fn kind_and_field_parse_from_wire_names() {
        assert_eq!("inventory_item".parse::<EntityKind>().unwrap(), EntityKind::InventoryItem);
        assert_eq!("phone".parse::<DedupField>().unwrap(), DedupField::Phone);
        assert!("Phone".parse::<DedupField>().is_err());
    }
}
