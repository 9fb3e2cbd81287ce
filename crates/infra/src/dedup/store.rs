//! Storage abstractions for duplicate detection, plus in-memory implementations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use mixerp_core::AlertId;
use mixerp_dedup::{
    AlertKey, AlertStatus, ClientRecord, DuplicateAlert, InventoryItemRecord, StaffRecord,
};

/// Store operation error.
///
/// These are infrastructure failures; lifecycle and validation rules are enforced by the
/// domain types before anything reaches a store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("alert not found: {0}")]
    NotFound(AlertId),
    #[error("storage error: {0}")]
    Backend(String),
}

/// Read access to the entity collections that are scanned.
#[async_trait]
pub trait EntitySource: Send + Sync {
    async fn inventory_items(&self) -> Result<Vec<InventoryItemRecord>, StoreError>;
    async fn clients(&self) -> Result<Vec<ClientRecord>, StoreError>;
    async fn staff(&self) -> Result<Vec<StaffRecord>, StoreError>;
}

/// Persistent duplicate alert storage.
///
/// Implementations must:
/// - treat `(entity_kind, field, entity_a, entity_b)` as unique across every status
/// - return alerts from `list` newest first (`created_at` desc, then id desc)
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Insert `alert` unless one with the same key already exists.
    ///
    /// Returns `true` when a new alert was stored.
    async fn insert_if_absent(&self, alert: DuplicateAlert) -> Result<bool, StoreError>;

    async fn get(&self, id: AlertId) -> Result<Option<DuplicateAlert>, StoreError>;

    /// Overwrite an existing alert (last writer wins).
    async fn update(&self, alert: &DuplicateAlert) -> Result<(), StoreError>;

    async fn list(
        &self,
        status: Option<AlertStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<DuplicateAlert>, StoreError>;

    async fn count(&self, status: Option<AlertStatus>) -> Result<u64, StoreError>;
}

#[async_trait]
impl<S> EntitySource for Arc<S>
where
    S: EntitySource + ?Sized,
{
    async fn inventory_items(&self) -> Result<Vec<InventoryItemRecord>, StoreError> {
        (**self).inventory_items().await
    }

    async fn clients(&self) -> Result<Vec<ClientRecord>, StoreError> {
        (**self).clients().await
    }

    async fn staff(&self) -> Result<Vec<StaffRecord>, StoreError> {
        (**self).staff().await
    }
}

#[async_trait]
impl<S> AlertStore for Arc<S>
where
    S: AlertStore + ?Sized,
{
    async fn insert_if_absent(&self, alert: DuplicateAlert) -> Result<bool, StoreError> {
        (**self).insert_if_absent(alert).await
    }

    async fn get(&self, id: AlertId) -> Result<Option<DuplicateAlert>, StoreError> {
        (**self).get(id).await
    }

    async fn update(&self, alert: &DuplicateAlert) -> Result<(), StoreError> {
        (**self).update(alert).await
    }

    async fn list(
        &self,
        status: Option<AlertStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<DuplicateAlert>, StoreError> {
        (**self).list(status, offset, limit).await
    }

    async fn count(&self, status: Option<AlertStatus>) -> Result<u64, StoreError> {
        (**self).count(status).await
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory entity source
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Entities {
    inventory_items: Vec<InventoryItemRecord>,
    clients: Vec<ClientRecord>,
    staff: Vec<StaffRecord>,
}

/// In-memory entity collections for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryEntitySource {
    inner: RwLock<Entities>,
}

impl InMemoryEntitySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn set_inventory_items(&self, items: Vec<InventoryItemRecord>) {
        if let Ok(mut e) = self.inner.write() {
            e.inventory_items = items;
        }
    }

    pub fn set_clients(&self, clients: Vec<ClientRecord>) {
        if let Ok(mut e) = self.inner.write() {
            e.clients = clients;
        }
    }

    pub fn set_staff(&self, staff: Vec<StaffRecord>) {
        if let Ok(mut e) = self.inner.write() {
            e.staff = staff;
        }
    }
}

#[async_trait]
impl EntitySource for InMemoryEntitySource {
    async fn inventory_items(&self) -> Result<Vec<InventoryItemRecord>, StoreError> {
        Ok(self.inner.read().map_err(|_| poisoned())?.inventory_items.clone())
    }

    async fn clients(&self) -> Result<Vec<ClientRecord>, StoreError> {
        Ok(self.inner.read().map_err(|_| poisoned())?.clients.clone())
    }

    async fn staff(&self) -> Result<Vec<StaffRecord>, StoreError> {
        Ok(self.inner.read().map_err(|_| poisoned())?.staff.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory alert store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Alerts {
    by_id: HashMap<AlertId, DuplicateAlert>,
    by_key: HashMap<AlertKey, AlertId>,
}

/// In-memory alert store for tests/dev.
///
/// `set_unavailable(true)` makes every call fail with [`StoreError::Backend`], which lets
/// tests exercise the degraded read paths.
#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    inner: RwLock<Alerts>,
    unavailable: AtomicBool,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("alert store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn insert_if_absent(&self, alert: DuplicateAlert) -> Result<bool, StoreError> {
        self.ensure_available()?;
        let mut alerts = self.inner.write().map_err(|_| poisoned())?;

        let key = alert.key();
        if alerts.by_key.contains_key(&key) {
            return Ok(false);
        }
        alerts.by_key.insert(key, alert.id);
        alerts.by_id.insert(alert.id, alert);
        Ok(true)
    }

    async fn get(&self, id: AlertId) -> Result<Option<DuplicateAlert>, StoreError> {
        self.ensure_available()?;
        let alerts = self.inner.read().map_err(|_| poisoned())?;
        Ok(alerts.by_id.get(&id).cloned())
    }

    async fn update(&self, alert: &DuplicateAlert) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut alerts = self.inner.write().map_err(|_| poisoned())?;
        match alerts.by_id.get_mut(&alert.id) {
            Some(existing) => {
                *existing = alert.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(alert.id)),
        }
    }

    async fn list(
        &self,
        status: Option<AlertStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<DuplicateAlert>, StoreError> {
        self.ensure_available()?;
        let alerts = self.inner.read().map_err(|_| poisoned())?;

        let mut result: Vec<DuplicateAlert> = alerts
            .by_id
            .values()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();

        result.sort_by(|x, y| y.created_at.cmp(&x.created_at).then_with(|| y.id.cmp(&x.id)));

        Ok(result
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, status: Option<AlertStatus>) -> Result<u64, StoreError> {
        self.ensure_available()?;
        let alerts = self.inner.read().map_err(|_| poisoned())?;
        let n = alerts
            .by_id
            .values()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .count();
        Ok(n as u64)
    }
}
