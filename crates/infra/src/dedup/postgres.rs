//! Postgres-backed entity source and alert store.
//!
//! Entity snapshots are read from the operational tables (`inventory_items`, `clients`,
//! `staff`). Alerts live in `duplicate_alerts`; the unique index on
//! `(entity_kind, field, entity_a, entity_b)` makes `insert_if_absent` a single
//! `INSERT .. ON CONFLICT DO NOTHING`, so concurrent scans cannot double-alert a pair.
//!
//! ## Error Mapping
//!
//! Every `sqlx::Error` becomes [`StoreError::Backend`] carrying the operation name.
//! Rows that cannot be decoded (unknown status/kind strings) are reported the same way.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use mixerp_core::{AlertId, EntityId};
use mixerp_dedup::{
    AlertStatus, ClientRecord, ClientStatus, DedupField, DuplicateAlert, EntityKind,
    InventoryItemRecord, StaffRecord, StaffStatus,
};

use super::store::{AlertStore, EntitySource, StoreError};

/// DDL for the alert table. Applied by [`PostgresDedupStore::ensure_schema`].
pub const ALERTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS duplicate_alerts (
    id            UUID PRIMARY KEY,
    entity_kind   TEXT NOT NULL,
    entity_a      TEXT NOT NULL,
    entity_b      TEXT NOT NULL,
    field         TEXT NOT NULL,
    matched_value TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'open'
                  CHECK (status IN ('open', 'resolved', 'ignored')),
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    resolved_by   TEXT,
    resolved_at   TIMESTAMPTZ
);

CREATE UNIQUE INDEX IF NOT EXISTS duplicate_alerts_pair_uq
    ON duplicate_alerts (entity_kind, field, entity_a, entity_b);

CREATE INDEX IF NOT EXISTS duplicate_alerts_status_created_idx
    ON duplicate_alerts (status, created_at DESC);
"#;

#[derive(Debug, Clone)]
pub struct PostgresDedupStore {
    pool: Arc<PgPool>,
}

impl PostgresDedupStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the alert table and its indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(ALERTS_SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl EntitySource for PostgresDedupStore {
    #[instrument(skip(self), err)]
    async fn inventory_items(&self) -> Result<Vec<InventoryItemRecord>, StoreError> {
        let rows = sqlx::query("SELECT id::text AS id, name, archived FROM inventory_items")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("inventory_items", e))?;

        rows.iter()
            .map(|row| {
                Ok(InventoryItemRecord {
                    id: EntityId::new(get::<String>(row, "id")?),
                    name: get(row, "name")?,
                    archived: get(row, "archived")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn clients(&self) -> Result<Vec<ClientRecord>, StoreError> {
        let rows = sqlx::query("SELECT id::text AS id, name, phone, email, status FROM clients")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("clients", e))?;

        rows.iter()
            .map(|row| {
                Ok(ClientRecord {
                    id: EntityId::new(get::<String>(row, "id")?),
                    name: get(row, "name")?,
                    phone: get(row, "phone")?,
                    email: get(row, "email")?,
                    status: client_status(&get::<String>(row, "status")?)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn staff(&self) -> Result<Vec<StaffRecord>, StoreError> {
        let rows = sqlx::query("SELECT id::text AS id, name, email, phone, status FROM staff")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("staff", e))?;

        rows.iter()
            .map(|row| {
                Ok(StaffRecord {
                    id: EntityId::new(get::<String>(row, "id")?),
                    name: get(row, "name")?,
                    email: get(row, "email")?,
                    phone: get(row, "phone")?,
                    status: staff_status(&get::<String>(row, "status")?)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl AlertStore for PostgresDedupStore {
    #[instrument(skip(self, alert), fields(alert_id = %alert.id), err)]
    async fn insert_if_absent(&self, alert: DuplicateAlert) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO duplicate_alerts
                (id, entity_kind, entity_a, entity_b, field, matched_value,
                 status, created_at, resolved_by, resolved_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (entity_kind, field, entity_a, entity_b) DO NOTHING
            "#,
        )
        .bind(alert.id.as_uuid())
        .bind(alert.entity_kind.as_str())
        .bind(alert.entity_a.as_str())
        .bind(alert.entity_b.as_str())
        .bind(alert.field.as_str())
        .bind(&alert.matched_value)
        .bind(alert.status.as_str())
        .bind(alert.created_at)
        .bind(alert.resolved_by.as_deref())
        .bind(alert.resolved_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_if_absent", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(alert_id = %id), err)]
    async fn get(&self, id: AlertId) -> Result<Option<DuplicateAlert>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ALERT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(alert_from_row).transpose()
    }

    #[instrument(skip(self, alert), fields(alert_id = %alert.id), err)]
    async fn update(&self, alert: &DuplicateAlert) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE duplicate_alerts
            SET status = $2, resolved_by = $3, resolved_at = $4
            WHERE id = $1
            "#,
        )
        .bind(alert.id.as_uuid())
        .bind(alert.status.as_str())
        .bind(alert.resolved_by.as_deref())
        .bind(alert.resolved_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(alert.id));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list(
        &self,
        status: Option<AlertStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<DuplicateAlert>, StoreError> {
        let rows = sqlx::query(&format!(
            "{SELECT_ALERT} WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(to_i64(limit))
        .bind(to_i64(offset))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(alert_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn count(&self, status: Option<AlertStatus>) -> Result<u64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM duplicate_alerts WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count", e))?;

        let n: i64 = get(&row, "n")?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

const SELECT_ALERT: &str = "SELECT id, entity_kind, entity_a, entity_b, field, matched_value, \
     status, created_at, resolved_by, resolved_at FROM duplicate_alerts";

fn alert_from_row(row: &PgRow) -> Result<DuplicateAlert, StoreError> {
    let id: Uuid = get(row, "id")?;
    let created_at: DateTime<Utc> = get(row, "created_at")?;

    Ok(DuplicateAlert {
        id: AlertId::from_uuid(id),
        entity_kind: decode::<EntityKind>(get(row, "entity_kind")?)?,
        entity_a: EntityId::new(get::<String>(row, "entity_a")?),
        entity_b: EntityId::new(get::<String>(row, "entity_b")?),
        field: decode::<DedupField>(get(row, "field")?)?,
        matched_value: get(row, "matched_value")?,
        status: decode::<AlertStatus>(get(row, "status")?)?,
        created_at,
        resolved_by: get(row, "resolved_by")?,
        resolved_at: get(row, "resolved_at")?,
    })
}

fn get<T>(row: &PgRow, column: &str) -> Result<T, StoreError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Backend(format!("failed to decode column {column}: {e}")))
}

fn decode<T>(raw: String) -> Result<T, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| StoreError::Backend(format!("unexpected stored value: {e}")))
}

fn client_status(raw: &str) -> Result<ClientStatus, StoreError> {
    match raw {
        "lead" => Ok(ClientStatus::Lead),
        "active" => Ok(ClientStatus::Active),
        "rejected" => Ok(ClientStatus::Rejected),
        other => Err(StoreError::Backend(format!("unknown client status '{other}'"))),
    }
}

fn staff_status(raw: &str) -> Result<StaffStatus, StoreError> {
    match raw {
        "active" => Ok(StaffStatus::Active),
        "terminated" => Ok(StaffStatus::Terminated),
        other => Err(StoreError::Backend(format!("unknown staff status '{other}'"))),
    }
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Backend(format!(
            "database error in {operation}: {} (code {})",
            db_err.message(),
            db_err.code().as_deref().unwrap_or("none"),
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Backend(format!("connection pool timed out in {operation}"))
        }
        other => StoreError::Backend(format!("{operation} failed: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_declares_pair_uniqueness() {
        assert!(ALERTS_SCHEMA.contains("UNIQUE INDEX IF NOT EXISTS duplicate_alerts_pair_uq"));
        assert!(ALERTS_SCHEMA.contains("(entity_kind, field, entity_a, entity_b)"));
    }

    #[test]
    fn status_strings_decode() {
        assert_eq!(client_status("lead").unwrap(), ClientStatus::Lead);
        assert!(client_status("Lead").is_err());
        assert_eq!(staff_status("terminated").unwrap(), StaffStatus::Terminated);
        assert_eq!(decode::<AlertStatus>("ignored".to_string()).unwrap(), AlertStatus::Ignored);
        assert!(decode::<EntityKind>("vehicle".to_string()).is_err());
    }

    #[test]
    fn paging_values_saturate() {
        assert_eq!(to_i64(u64::MAX), i64::MAX);
        assert_eq!(to_i64(50), 50);
    }
}
