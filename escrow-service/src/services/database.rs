//! PostgreSQL storage backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    EntryType, LedgerEntry, Money, Order, OrderStatus, PayoutMethod, PayoutMethodDetails,
    PayoutRequest, PayoutStatus, Vendor,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{LedgerStore, VendorRepository};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct OrderRow {
    order_id: Uuid,
    vendor_id: Uuid,
    customer_id: Uuid,
    gross_minor: i64,
    deposit_minor: i64,
    currency: String,
    platform_fee_rate: Decimal,
    status: String,
    created_utc: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, StoreError> {
        let status = OrderStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!(
                "unknown order status '{}' for order {}",
                row.status,
                row.order_id
            ))
        })?;
        Ok(Order {
            order_id: row.order_id,
            vendor_id: row.vendor_id,
            customer_id: row.customer_id,
            gross_amount: Money::new(row.gross_minor, row.currency.clone()),
            deposit_amount: Money::new(row.deposit_minor, row.currency),
            platform_fee_rate: row.platform_fee_rate,
            status,
            created_utc: row.created_utc,
        })
    }
}

#[derive(FromRow)]
struct EntryRow {
    entry_id: Uuid,
    order_id: Uuid,
    vendor_id: Uuid,
    entry_type: String,
    amount_minor: i64,
    currency: String,
    created_utc: DateTime<Utc>,
}

impl TryFrom<EntryRow> for LedgerEntry {
    type Error = StoreError;

    fn try_from(row: EntryRow) -> Result<Self, StoreError> {
        let entry_type = EntryType::parse(&row.entry_type).ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!(
                "unknown entry type '{}' for entry {}",
                row.entry_type,
                row.entry_id
            ))
        })?;
        Ok(LedgerEntry {
            entry_id: row.entry_id,
            order_id: row.order_id,
            vendor_id: row.vendor_id,
            entry_type,
            amount: Money::new(row.amount_minor, row.currency),
            created_utc: row.created_utc,
        })
    }
}

#[derive(FromRow)]
struct PayoutRow {
    payout_id: Uuid,
    vendor_id: Uuid,
    requested_minor: i64,
    commission_minor: i64,
    net_minor: i64,
    currency: String,
    status: String,
    method: String,
    created_utc: DateTime<Utc>,
    resolved_utc: Option<DateTime<Utc>>,
}

impl TryFrom<PayoutRow> for PayoutRequest {
    type Error = StoreError;

    fn try_from(row: PayoutRow) -> Result<Self, StoreError> {
        let status = PayoutStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!(
                "unknown payout status '{}' for payout {}",
                row.status,
                row.payout_id
            ))
        })?;
        let method = PayoutMethod::parse(&row.method).ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!(
                "unknown payout method '{}' for payout {}",
                row.method,
                row.payout_id
            ))
        })?;
        Ok(PayoutRequest {
            payout_id: row.payout_id,
            vendor_id: row.vendor_id,
            requested_amount: Money::new(row.requested_minor, row.currency.clone()),
            commission: Money::new(row.commission_minor, row.currency.clone()),
            net_amount: Money::new(row.net_minor, row.currency),
            status,
            method,
            created_utc: row.created_utc,
            resolved_utc: row.resolved_utc,
        })
    }
}

#[derive(FromRow)]
struct VendorRow {
    vendor_id: Uuid,
    display_name: String,
    payout_method: Option<serde_json::Value>,
    created_utc: DateTime<Utc>,
}

impl TryFrom<VendorRow> for Vendor {
    type Error = StoreError;

    fn try_from(row: VendorRow) -> Result<Self, StoreError> {
        let payout_method = row
            .payout_method
            .map(serde_json::from_value::<PayoutMethodDetails>)
            .transpose()
            .map_err(|e| {
                StoreError::Backend(anyhow::anyhow!(
                    "corrupt payout method for vendor {}: {}",
                    row.vendor_id,
                    e
                ))
            })?;
        Ok(Vendor {
            vendor_id: row.vendor_id,
            display_name: row.display_name,
            payout_method,
            created_utc: row.created_utc,
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(format!("{}: unique violation", context))
        }
        _ => StoreError::Backend(anyhow::anyhow!("{}: {}", context, e)),
    }
}

impl PgStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "escrow-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    #[instrument(skip(self, order), fields(order_id = %order.order_id, vendor_id = %order.vendor_id))]
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_order"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO orders (order_id, vendor_id, customer_id, gross_minor, deposit_minor, currency, platform_fee_rate, status, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.order_id)
        .bind(order.vendor_id)
        .bind(order.customer_id)
        .bind(order.gross_amount.minor_units)
        .bind(order.deposit_amount.minor_units)
        .bind(&order.gross_amount.currency)
        .bind(order.platform_fee_rate)
        .bind(order.status.as_str())
        .bind(order.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert order", e))?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_order"])
            .start_timer();

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, vendor_id, customer_id, gross_minor, deposit_minor, currency, platform_fee_rate, status, created_utc
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get order", e))?;

        timer.observe_duration();
        row.map(Order::try_from).transpose()
    }

    #[instrument(skip(self), fields(order_id = %order_id, from = %from, to = %to))]
    async fn update_order_status(
        &self,
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_order_status"])
            .start_timer();

        let result = sqlx::query(
            "UPDATE orders SET status = $1 WHERE order_id = $2 AND status = $3",
        )
        .bind(to.as_str())
        .bind(order_id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update order status", e))?;

        timer.observe_duration();
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, entries), fields(entry_count = entries.len()))]
    async fn append_entries(&self, entries: &[LedgerEntry]) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["append_entries"])
            .start_timer();

        // The unique (order_id, entry_type) index makes duplicate holds or
        // double releases fail here even if two writers race past the
        // service-level checks; the whole batch rolls back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("Failed to begin transaction: {}", e)))?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO ledger_entries (entry_id, order_id, vendor_id, entry_type, amount_minor, currency, created_utc)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(entry.entry_id)
            .bind(entry.order_id)
            .bind(entry.vendor_id)
            .bind(entry.entry_type.as_str())
            .bind(entry.amount.minor_units)
            .bind(&entry.amount.currency)
            .bind(entry.created_utc)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to append ledger entry", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("Failed to commit entries: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn entries_for_order(&self, order_id: Uuid) -> Result<Vec<LedgerEntry>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["entries_for_order"])
            .start_timer();

        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT entry_id, order_id, vendor_id, entry_type, amount_minor, currency, created_utc
            FROM ledger_entries
            WHERE order_id = $1
            ORDER BY created_utc, entry_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get entries", e))?;

        timer.observe_duration();
        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    async fn entries_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<LedgerEntry>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["entries_for_vendor"])
            .start_timer();

        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT entry_id, order_id, vendor_id, entry_type, amount_minor, currency, created_utc
            FROM ledger_entries
            WHERE vendor_id = $1
            ORDER BY created_utc, entry_id
            "#,
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get vendor entries", e))?;

        timer.observe_duration();
        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    #[instrument(skip(self, payout), fields(payout_id = %payout.payout_id, vendor_id = %payout.vendor_id))]
    async fn insert_payout(&self, payout: &PayoutRequest) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_payout"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO payout_requests (payout_id, vendor_id, requested_minor, commission_minor, net_minor, currency, status, method, created_utc, resolved_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(payout.payout_id)
        .bind(payout.vendor_id)
        .bind(payout.requested_amount.minor_units)
        .bind(payout.commission.minor_units)
        .bind(payout.net_amount.minor_units)
        .bind(&payout.requested_amount.currency)
        .bind(payout.status.as_str())
        .bind(payout.method.as_str())
        .bind(payout.created_utc)
        .bind(payout.resolved_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert payout", e))?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip(self), fields(payout_id = %payout_id))]
    async fn get_payout(&self, payout_id: Uuid) -> Result<Option<PayoutRequest>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_payout"])
            .start_timer();

        let row = sqlx::query_as::<_, PayoutRow>(
            r#"
            SELECT payout_id, vendor_id, requested_minor, commission_minor, net_minor, currency, status, method, created_utc, resolved_utc
            FROM payout_requests
            WHERE payout_id = $1
            "#,
        )
        .bind(payout_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get payout", e))?;

        timer.observe_duration();
        row.map(PayoutRequest::try_from).transpose()
    }

    #[instrument(skip(self), fields(payout_id = %payout_id, from = %from, to = %to))]
    async fn update_payout_status(
        &self,
        payout_id: Uuid,
        from: PayoutStatus,
        to: PayoutStatus,
        resolved_utc: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_payout_status"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE payout_requests
            SET status = $1, resolved_utc = $2
            WHERE payout_id = $3 AND status = $4
            "#,
        )
        .bind(to.as_str())
        .bind(resolved_utc)
        .bind(payout_id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update payout status", e))?;

        timer.observe_duration();
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    async fn payouts_for_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<PayoutRequest>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["payouts_for_vendor"])
            .start_timer();

        let rows = sqlx::query_as::<_, PayoutRow>(
            r#"
            SELECT payout_id, vendor_id, requested_minor, commission_minor, net_minor, currency, status, method, created_utc, resolved_utc
            FROM payout_requests
            WHERE vendor_id = $1
            ORDER BY created_utc, payout_id
            "#,
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list payouts", e))?;

        timer.observe_duration();
        rows.into_iter().map(PayoutRequest::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn commission_total_minor(&self) -> Result<i64, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["commission_total"])
            .start_timer();

        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_minor)::bigint FROM ledger_entries WHERE entry_type = 'COMMISSION'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to total commission", e))?;

        timer.observe_duration();
        Ok(total.unwrap_or(0))
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl VendorRepository for PgStore {
    #[instrument(skip(self, vendor), fields(vendor_id = %vendor.vendor_id))]
    async fn insert_vendor(&self, vendor: &Vendor) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_vendor"])
            .start_timer();

        let payout_method = vendor
            .payout_method
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("Failed to encode method: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO vendors (vendor_id, display_name, payout_method, created_utc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(vendor.vendor_id)
        .bind(&vendor.display_name)
        .bind(payout_method)
        .bind(vendor.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert vendor", e))?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    async fn get_vendor(&self, vendor_id: Uuid) -> Result<Option<Vendor>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_vendor"])
            .start_timer();

        let row = sqlx::query_as::<_, VendorRow>(
            r#"
            SELECT vendor_id, display_name, payout_method, created_utc
            FROM vendors
            WHERE vendor_id = $1
            "#,
        )
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get vendor", e))?;

        timer.observe_duration();
        row.map(Vendor::try_from).transpose()
    }

    #[instrument(skip(self, details), fields(vendor_id = %vendor_id))]
    async fn set_payout_method(
        &self,
        vendor_id: Uuid,
        details: &PayoutMethodDetails,
    ) -> Result<bool, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_payout_method"])
            .start_timer();

        let payout_method = serde_json::to_value(details)
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("Failed to encode method: {}", e)))?;

        let result = sqlx::query(
            "UPDATE vendors SET payout_method = $1 WHERE vendor_id = $2",
        )
        .bind(payout_method)
        .bind(vendor_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to set payout method", e))?;

        timer.observe_duration();
        Ok(result.rows_affected() == 1)
    }
}
