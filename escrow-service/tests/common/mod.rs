//! Common test utilities for escrow-service integration tests.

#![allow(dead_code)]

use escrow_service::config::EscrowConfig;
use escrow_service::models::{
    ActorContext, ActorRole, Money, OrderStatus, PayoutMethodDetails, Vendor,
};
use escrow_service::services::{
    BalanceService, EscrowService, MemoryStore, OrderService, PayoutRules, PayoutService,
    VendorLocks,
};
use escrow_service::startup::Application;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,escrow_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// The full service stack over in-memory storage.
pub struct TestLedger {
    pub store: Arc<MemoryStore>,
    pub orders: OrderService,
    pub escrow: EscrowService,
    pub payouts: PayoutService,
    pub balances: BalanceService,
}

pub fn inr(minor_units: i64) -> Money {
    Money::new(minor_units, "INR")
}

pub fn admin() -> ActorContext {
    ActorContext {
        actor_id: Uuid::new_v4(),
        role: ActorRole::Admin,
    }
}

pub fn vendor_actor(vendor_id: Uuid) -> ActorContext {
    ActorContext {
        actor_id: vendor_id,
        role: ActorRole::Vendor,
    }
}

pub fn ledger() -> TestLedger {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let locks = VendorLocks::new();
    let rules = PayoutRules {
        currency: "INR".to_string(),
        minimum_minor: 10_000, // Rs 100
        fee_rate: Decimal::ZERO,
    };

    TestLedger {
        store: store.clone(),
        orders: OrderService::new(store.clone(), store.clone(), Decimal::new(10, 2)),
        escrow: EscrowService::new(store.clone(), locks.clone()),
        payouts: PayoutService::new(store.clone(), store.clone(), locks, rules),
        balances: BalanceService::new(store, "INR".to_string()),
    }
}

/// Register a vendor with bank details on file.
pub async fn vendor_with_bank(l: &TestLedger) -> Uuid {
    let vendor = Vendor {
        vendor_id: Uuid::new_v4(),
        display_name: "Threads & Co".to_string(),
        payout_method: Some(PayoutMethodDetails::BankTransfer {
            account_name: "Threads & Co".to_string(),
            account_number: "0012345678".to_string(),
            ifsc: "HDFC0000123".to_string(),
        }),
        created_utc: chrono::Utc::now(),
    };
    use escrow_service::services::VendorRepository;
    l.store.insert_vendor(&vendor).await.unwrap();
    vendor.vendor_id
}

/// Register a vendor without any payout method.
pub async fn vendor_without_method(l: &TestLedger) -> Uuid {
    let vendor = Vendor {
        vendor_id: Uuid::new_v4(),
        display_name: "No Details Yet".to_string(),
        payout_method: None,
        created_utc: chrono::Utc::now(),
    };
    use escrow_service::services::VendorRepository;
    l.store.insert_vendor(&vendor).await.unwrap();
    vendor.vendor_id
}

/// Create an order and walk it to COMPLETED.
pub async fn completed_order(
    l: &TestLedger,
    vendor_id: Uuid,
    gross_minor: i64,
    fee_rate: Decimal,
) -> Uuid {
    let order = l
        .orders
        .create_order(
            vendor_id,
            Uuid::new_v4(),
            inr(gross_minor),
            inr(0),
            Some(fee_rate),
        )
        .await
        .unwrap();
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Active,
        OrderStatus::Delivered,
        OrderStatus::Completed,
    ] {
        l.orders.advance_status(order.order_id, status).await.unwrap();
    }
    order.order_id
}

/// Give the vendor `minor_units` of available balance through a fee-free
/// completed rental.
pub async fn fund_vendor(l: &TestLedger, vendor_id: Uuid, minor_units: i64) {
    let order_id = completed_order(l, vendor_id, minor_units, Decimal::ZERO).await;
    l.escrow
        .create_hold(order_id, vendor_id, inr(minor_units))
        .await
        .unwrap();
    l.escrow.release_hold(order_id).await.unwrap();
}

/// Spawn the HTTP application over in-memory storage; returns its base URL.
pub async fn spawn_app() -> String {
    init_tracing();

    let config = EscrowConfig::for_memory();
    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    format!("http://127.0.0.1:{}", port)
}
