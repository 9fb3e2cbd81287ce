//! Duplicate detector service: permission-gated scan and alert triage.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use mixerp_auth::{Actor, AuthzError, Permission};
use mixerp_core::{AlertId, DomainError, PageInfo, PageRequest};
use mixerp_dedup::{AlertStatus, CandidatePair, DuplicateAlert, EntityKind, detect};

use super::store::{AlertStore, EntitySource, StoreError};

/// Permission required for every detector operation.
pub const REQUIRED_PERMISSION: Permission = Permission::ManageSystemSettings;

#[derive(Debug, thiserror::Error)]
pub enum DedupError {
    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("alert not found: {0}")]
    NotFound(AlertId),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for DedupError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidState(msg) => DedupError::InvalidState(msg),
            DomainError::Validation(msg)
            | DomainError::InvalidId(msg)
            | DomainError::NotFound(msg)
            | DomainError::Conflict(msg) => DedupError::Validation(msg),
        }
    }
}

/// Per-kind scan counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub pairs_considered: u64,
    pub alerts_created: u64,
}

/// Outcome of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub alerts_created: u64,
    pub pairs_considered: u64,
    pub per_kind: BTreeMap<EntityKind, KindReport>,
}

/// A page of alerts plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertPage {
    pub alerts: Vec<DuplicateAlert>,
    pub pagination: PageInfo,
}

impl AlertPage {
    pub fn empty(request: PageRequest) -> Self {
        Self {
            alerts: Vec::new(),
            pagination: PageInfo::new(request, 0),
        }
    }
}

/// Finds likely-duplicate records and maintains the alert triage queue.
///
/// Every operation checks [`REQUIRED_PERMISSION`] before touching a store, so a denied
/// call has no side effects.
#[derive(Debug, Clone)]
pub struct DuplicateDetector<E, A> {
    entities: E,
    alerts: A,
}

impl<E, A> DuplicateDetector<E, A>
where
    E: EntitySource,
    A: AlertStore,
{
    pub fn new(entities: E, alerts: A) -> Self {
        Self { entities, alerts }
    }

    pub fn alerts(&self) -> &A {
        &self.alerts
    }

    /// Scan every supported entity kind and record newly-seen duplicate pairs.
    ///
    /// Re-running with unchanged data creates no alerts: a pair+field that already has an
    /// alert in any status is skipped.
    #[instrument(skip_all, fields(actor = %actor.display_name))]
    pub async fn scan(&self, actor: &Actor) -> Result<ScanReport, DedupError> {
        actor.require(REQUIRED_PERMISSION)?;

        let (items, clients, staff) = tokio::try_join!(
            self.entities.inventory_items(),
            self.entities.clients(),
            self.entities.staff(),
        )?;

        info!(
            inventory_items = items.len(),
            clients = clients.len(),
            staff = staff.len(),
            "duplicate scan started"
        );

        let mut report = ScanReport::default();
        self.record_pairs(EntityKind::InventoryItem, detect(&items), &mut report).await?;
        self.record_pairs(EntityKind::Client, detect(&clients), &mut report).await?;
        self.record_pairs(EntityKind::Staff, detect(&staff), &mut report).await?;

        info!(
            alerts_created = report.alerts_created,
            pairs_considered = report.pairs_considered,
            "duplicate scan finished"
        );
        Ok(report)
    }

    async fn record_pairs(
        &self,
        kind: EntityKind,
        pairs: Vec<CandidatePair>,
        report: &mut ScanReport,
    ) -> Result<(), DedupError> {
        let now = Utc::now();
        let mut kind_report = KindReport::default();

        for pair in pairs {
            kind_report.pairs_considered += 1;
            let alert = DuplicateAlert::open(pair, now);
            let alert_id = alert.id;
            let field = alert.field;

            if self.alerts.insert_if_absent(alert).await? {
                kind_report.alerts_created += 1;
                debug!(alert_id = %alert_id, kind = %kind, field = %field, "duplicate alert created");
            }
        }

        report.pairs_considered += kind_report.pairs_considered;
        report.alerts_created += kind_report.alerts_created;
        report.per_kind.insert(kind, kind_report);
        Ok(())
    }

    /// Page through alerts, newest first.
    pub async fn list_alerts(
        &self,
        actor: &Actor,
        status: Option<AlertStatus>,
        page: PageRequest,
    ) -> Result<AlertPage, DedupError> {
        actor.require(REQUIRED_PERMISSION)?;
        page.validate()?;

        let total = self.alerts.count(status).await?;
        let alerts = self.alerts.list(status, page.offset(), page.limit()).await?;

        Ok(AlertPage {
            alerts,
            pagination: PageInfo::new(page, total),
        })
    }

    /// Informational variant of [`Self::list_alerts`]: store failures degrade to an empty
    /// page. Denials and invalid paging are still returned.
    pub async fn list_alerts_or_empty(
        &self,
        actor: &Actor,
        status: Option<AlertStatus>,
        page: PageRequest,
    ) -> Result<AlertPage, DedupError> {
        match self.list_alerts(actor, status, page).await {
            Err(DedupError::Store(e)) => {
                warn!(error = %e, "alert list unavailable; returning empty page");
                Ok(AlertPage::empty(page))
            }
            other => other,
        }
    }

    /// Number of open alerts for badges and dashboards. Never fails: any error reads as 0.
    pub async fn open_alert_count(&self, actor: &Actor) -> u64 {
        // Denials are logged by the permission check itself.
        if actor.require(REQUIRED_PERMISSION).is_err() {
            return 0;
        }
        match self.alerts.count(Some(AlertStatus::Open)).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "open alert count unavailable");
                0
            }
        }
    }

    /// Mark an open alert as a confirmed duplicate that has been dealt with.
    #[instrument(skip_all, fields(actor = %actor.display_name, alert_id = %alert_id))]
    pub async fn resolve(&self, actor: &Actor, alert_id: AlertId) -> Result<DuplicateAlert, DedupError> {
        self.close(actor, alert_id, AlertStatus::Resolved).await
    }

    /// Dismiss an open alert as a false positive.
    #[instrument(skip_all, fields(actor = %actor.display_name, alert_id = %alert_id))]
    pub async fn ignore(&self, actor: &Actor, alert_id: AlertId) -> Result<DuplicateAlert, DedupError> {
        self.close(actor, alert_id, AlertStatus::Ignored).await
    }

    async fn close(
        &self,
        actor: &Actor,
        alert_id: AlertId,
        to: AlertStatus,
    ) -> Result<DuplicateAlert, DedupError> {
        actor.require(REQUIRED_PERMISSION)?;

        let mut alert = self
            .alerts
            .get(alert_id)
            .await?
            .ok_or(DedupError::NotFound(alert_id))?;

        let now = Utc::now();
        match to {
            AlertStatus::Resolved => alert.resolve(&actor.display_name, now)?,
            AlertStatus::Ignored => alert.ignore(&actor.display_name, now)?,
            AlertStatus::Open => {
                return Err(DedupError::InvalidState("alerts cannot be reopened".to_string()));
            }
        }

        self.alerts.update(&alert).await.map_err(|e| match e {
            StoreError::NotFound(id) => DedupError::NotFound(id),
            other => DedupError::Store(other),
        })?;

        info!(status = %alert.status, "duplicate alert closed");
        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dedup::store::{InMemoryAlertStore, InMemoryEntitySource};
    use mixerp_dedup::{ClientRecord, InventoryItemRecord, StaffRecord};
    use proptest::prelude::*;

    type TestDetector = DuplicateDetector<Arc<InMemoryEntitySource>, Arc<InMemoryAlertStore>>;

    fn admin() -> Actor {
        Actor::new("Ada Admin", "SuperAdmin")
    }

    fn setup() -> (Arc<InMemoryEntitySource>, Arc<InMemoryAlertStore>, TestDetector) {
        let entities = InMemoryEntitySource::arc();
        let alerts = InMemoryAlertStore::arc();
        let detector = DuplicateDetector::new(entities.clone(), alerts.clone());
        (entities, alerts, detector)
    }

    fn seed(entities: &InMemoryEntitySource) {
        entities.set_inventory_items(vec![
            InventoryItemRecord::new("a", "Acme"),
            InventoryItemRecord::new("b", "ACME"),
            InventoryItemRecord::new("c", "Other"),
        ]);
        entities.set_clients(vec![
            ClientRecord::new("c1", "Bamburi Builders").with_phone("0722000111"),
            ClientRecord::new("c2", "Rift Contractors").with_phone("0722000111"),
            ClientRecord::new("c3", "No Phone Ltd"),
            ClientRecord::new("c4", "Empty Phone Ltd").with_phone(""),
        ]);
        entities.set_staff(vec![
            StaffRecord::new("s1", "Jo").with_email("jo@yard.co"),
            StaffRecord::new("s2", "Joe").with_email("JO@yard.co"),
        ]);
    }

    #[tokio::test]
    async fn scan_creates_alerts_then_is_idempotent() {
        let (entities, _alerts, detector) = setup();
        seed(&entities);

        let first = detector.scan(&admin()).await.unwrap();
        assert_eq!(first.alerts_created, 3);
        assert_eq!(first.per_kind[&EntityKind::InventoryItem].alerts_created, 1);
        assert_eq!(first.per_kind[&EntityKind::Client].alerts_created, 1);
        assert_eq!(first.per_kind[&EntityKind::Staff].alerts_created, 1);

        let second = detector.scan(&admin()).await.unwrap();
        assert_eq!(second.alerts_created, 0);
        assert_eq!(second.pairs_considered, 3);
    }

    #[tokio::test]
    async fn scan_pairs_only_matching_names() {
        let (entities, _alerts, detector) = setup();
        entities.set_inventory_items(vec![
            InventoryItemRecord::new("a", "Acme"),
            InventoryItemRecord::new("b", "ACME"),
            InventoryItemRecord::new("c", "Other"),
        ]);

        detector.scan(&admin()).await.unwrap();
        let page = detector.list_alerts(&admin(), None, PageRequest::default()).await.unwrap();

        assert_eq!(page.alerts.len(), 1);
        let alert = &page.alerts[0];
        assert_eq!((alert.entity_a.as_str(), alert.entity_b.as_str()), ("a", "b"));
        assert_eq!(alert.matched_value, "Acme");
        assert_eq!(alert.status, AlertStatus::Open);
    }

    #[tokio::test]
    async fn ignored_pairs_are_not_realerted() {
        let (entities, _alerts, detector) = setup();
        seed(&entities);

        detector.scan(&admin()).await.unwrap();
        let page = detector.list_alerts(&admin(), None, PageRequest::default()).await.unwrap();
        for alert in &page.alerts {
            detector.ignore(&admin(), alert.id).await.unwrap();
        }

        let again = detector.scan(&admin()).await.unwrap();
        assert_eq!(again.alerts_created, 0);
        assert_eq!(detector.open_alert_count(&admin()).await, 0);
    }

    #[tokio::test]
    async fn every_operation_requires_manage_system_settings() {
        let (entities, alerts, detector) = setup();
        seed(&entities);
        let manager = Actor::new("Mo Manager", "Manager");

        assert!(matches!(detector.scan(&manager).await, Err(DedupError::Unauthorized(_))));
        assert_eq!(alerts.count(None).await.unwrap(), 0);

        detector.scan(&admin()).await.unwrap();
        let id = detector
            .list_alerts(&admin(), None, PageRequest::default())
            .await
            .unwrap()
            .alerts[0]
            .id;

        assert!(matches!(
            detector.list_alerts(&manager, None, PageRequest::default()).await,
            Err(DedupError::Unauthorized(_))
        ));
        assert!(matches!(detector.resolve(&manager, id).await, Err(DedupError::Unauthorized(_))));
        assert!(matches!(detector.ignore(&manager, id).await, Err(DedupError::Unauthorized(_))));
        assert_eq!(detector.open_alert_count(&manager).await, 0);

        let untouched = alerts.get(id).await.unwrap().unwrap();
        assert_eq!(untouched.status, AlertStatus::Open);
    }

    #[tokio::test]
    async fn resolve_stamps_provenance_and_second_close_is_rejected() {
        let (entities, alerts, detector) = setup();
        seed(&entities);
        detector.scan(&admin()).await.unwrap();
        let id = alerts.list(None, 0, 1).await.unwrap()[0].id;

        let resolved = detector.resolve(&admin(), id).await.unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("Ada Admin"));
        assert!(resolved.resolved_at.is_some());

        let other = Actor::new("Someone Else", "SuperAdmin");
        assert!(matches!(detector.resolve(&other, id).await, Err(DedupError::InvalidState(_))));
        assert!(matches!(detector.ignore(&other, id).await, Err(DedupError::InvalidState(_))));

        let stored = alerts.get(id).await.unwrap().unwrap();
        assert_eq!(stored.resolved_by, resolved.resolved_by);
        assert_eq!(stored.resolved_at, resolved.resolved_at);
        assert_eq!(stored.status, AlertStatus::Resolved);
    }

    #[tokio::test]
    async fn unknown_alert_is_not_found() {
        let (_entities, _alerts, detector) = setup();
        let id = AlertId::new();
        assert!(matches!(detector.resolve(&admin(), id).await, Err(DedupError::NotFound(x)) if x == id));
    }

    #[tokio::test]
    async fn pagination_reports_total_pages() {
        let (entities, _alerts, detector) = setup();
        // 16 identical names give C(16, 2) = 120 pairs.
        let mut items: Vec<InventoryItemRecord> =
            (0..16).map(|i| InventoryItemRecord::new(format!("i{i:02}"), "Ballast")).collect();
        // 3 + 1 + 1 more pairs: 125 in total.
        items.extend((0..3).map(|i| InventoryItemRecord::new(format!("s{i}"), "Sand")));
        items.extend((0..2).map(|i| InventoryItemRecord::new(format!("g{i}"), "Gravel")));
        items.extend((0..2).map(|i| InventoryItemRecord::new(format!("w{i}"), "Water")));
        entities.set_inventory_items(items);

        let report = detector.scan(&admin()).await.unwrap();
        assert_eq!(report.alerts_created, 125);

        let req = PageRequest { page: 3, page_size: 50 };
        let page = detector.list_alerts(&admin(), None, req).await.unwrap();
        assert_eq!(page.pagination.total_count, 125);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.alerts.len(), 25);
    }

    #[tokio::test]
    async fn invalid_paging_is_a_validation_error() {
        let (_entities, _alerts, detector) = setup();
        let req = PageRequest { page: 0, page_size: 50 };
        assert!(matches!(
            detector.list_alerts(&admin(), None, req).await,
            Err(DedupError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn read_paths_degrade_when_store_is_down() {
        let (entities, alerts, detector) = setup();
        seed(&entities);
        detector.scan(&admin()).await.unwrap();
        alerts.set_unavailable(true);

        let page = detector
            .list_alerts_or_empty(&admin(), Some(AlertStatus::Open), PageRequest::default())
            .await
            .unwrap();
        assert!(page.alerts.is_empty());
        assert_eq!(page.pagination.total_pages, 0);
        assert_eq!(detector.open_alert_count(&admin()).await, 0);

        // Mutations never degrade.
        assert!(matches!(detector.scan(&admin()).await, Err(DedupError::Store(_))));
        assert!(matches!(
            detector.resolve(&admin(), AlertId::new()).await,
            Err(DedupError::Store(_))
        ));

        // Denials are still reported on the lenient path.
        let clerk = Actor::new("Cy", "Storekeeper");
        assert!(matches!(
            detector.list_alerts_or_empty(&clerk, None, PageRequest::default()).await,
            Err(DedupError::Unauthorized(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 32,
            ..ProptestConfig::default()
        })]

        /// Property: a second scan over unchanged data never creates alerts.
        #[test]
        fn rescans_are_idempotent(
            names in prop::collection::vec("[ab]{1,2}", 0..12),
            phones in prop::collection::vec(prop_oneof![Just(String::new()), "[0-9]{2}"], 0..12),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let (entities, _alerts, detector) = setup();
                entities.set_inventory_items(
                    names.iter().enumerate().map(|(i, n)| InventoryItemRecord::new(format!("i{i}"), n.clone())).collect(),
                );
                entities.set_clients(
                    phones.iter().enumerate().map(|(i, p)| ClientRecord::new(format!("c{i}"), format!("Client {i}")).with_phone(p.clone())).collect(),
                );

                let first = detector.scan(&admin()).await.unwrap();
                let second = detector.scan(&admin()).await.unwrap();
                assert_eq!(second.alerts_created, 0);
                assert_eq!(second.pairs_considered, first.pairs_considered);
                assert_eq!(detector.alerts().count(None).await.unwrap(), first.alerts_created);
            });
        }
    }
}
