//! Black-box HTTP tests against a running instance over in-memory storage.

mod common;

use common::spawn_app;
use serde_json::{Value, json};
use uuid::Uuid;

fn money(minor_units: i64) -> Value {
    json!({ "minor_units": minor_units, "currency": "INR" })
}

fn admin_headers(client: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    client
        .header("x-actor-id", Uuid::new_v4().to_string())
        .header("x-actor-role", "ADMIN")
}

fn vendor_headers(client: reqwest::RequestBuilder, vendor_id: &str) -> reqwest::RequestBuilder {
    client
        .header("x-actor-id", vendor_id)
        .header("x-actor-role", "VENDOR")
}

async fn register_vendor(client: &reqwest::Client, base: &str) -> String {
    let resp = client
        .post(format!("{base}/vendors"))
        .json(&json!({
            "display_name": "Lens Rentals",
            "payout_method": {
                "kind": "BANK_TRANSFER",
                "account_name": "Lens Rentals",
                "account_number": "9876543210",
                "ifsc": "ICIC0000042"
            }
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["vendor_id"].as_str().unwrap().to_string()
}

/// Create an order, walk it to COMPLETED, hold and release its escrow.
/// Returns (vendor_id, order_id).
async fn funded_vendor(client: &reqwest::Client, base: &str, gross_minor: i64) -> (String, String) {
    let vendor_id = register_vendor(client, base).await;

    let resp = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "vendor_id": vendor_id,
            "customer_id": Uuid::new_v4(),
            "gross_amount": money(gross_minor),
            "deposit_amount": money(0),
            "platform_fee_rate": "0"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let order: Value = resp.json().await.unwrap();
    let order_id = order["order_id"].as_str().unwrap().to_string();

    for status in ["CONFIRMED", "ACTIVE", "DELIVERED", "COMPLETED"] {
        let resp = client
            .post(format!("{base}/orders/{order_id}/status"))
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = client
        .post(format!("{base}/escrow/holds"))
        .json(&json!({
            "order_id": order_id,
            "vendor_id": vendor_id,
            "amount": money(gross_minor)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .post(format!("{base}/escrow/holds/{order_id}/release"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    (vendor_id, order_id)
}

#[tokio::test]
async fn health_and_metrics_endpoints_respond() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    for path in ["/health", "/ready", "/metrics"] {
        let resp = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), 200, "{path}");
    }
}

#[tokio::test]
async fn full_rental_lifecycle_over_http() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let vendor_id = register_vendor(&client, &base).await;

    // Order at the default 10% platform rate.
    let resp = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "vendor_id": vendor_id,
            "customer_id": Uuid::new_v4(),
            "gross_amount": money(100_000),
            "deposit_amount": money(20_000)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let order: Value = resp.json().await.unwrap();
    let order_id = order["order_id"].as_str().unwrap();
    assert_eq!(order["status"], "PENDING");

    for status in ["CONFIRMED", "ACTIVE", "DELIVERED", "COMPLETED"] {
        let resp = client
            .post(format!("{base}/orders/{order_id}/status"))
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = client
        .post(format!("{base}/escrow/holds"))
        .json(&json!({
            "order_id": order_id,
            "vendor_id": vendor_id,
            "amount": money(100_000)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let hold: Value = resp.json().await.unwrap();
    assert_eq!(hold["entry_type"], "ESCROW_HOLD");
    assert_eq!(hold["amount"]["minor_units"], 100_000);
    assert_eq!(hold["amount"]["currency"], "INR");

    let resp = client
        .post(format!("{base}/escrow/holds/{order_id}/release"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let split: Value = resp.json().await.unwrap();
    assert_eq!(split["commission"]["minor_units"], 10_000);
    assert_eq!(split["net"]["minor_units"], 90_000);

    let resp = client
        .get(format!("{base}/vendors/{vendor_id}/balance"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let balance: Value = resp.json().await.unwrap();
    assert_eq!(balance["available"]["minor_units"], 90_000);
    assert_eq!(balance["pending_escrow"]["minor_units"], 0);

    // Two entries for the order plus the commission row.
    let resp = client
        .get(format!("{base}/orders/{order_id}/entries"))
        .send()
        .await
        .unwrap();
    let entries: Value = resp.json().await.unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn payout_flow_over_http() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let (vendor_id, _) = funded_vendor(&client, &base, 500_000).await;

    let resp = vendor_headers(client.post(format!("{base}/payouts")), &vendor_id)
        .json(&json!({
            "vendor_id": vendor_id,
            "amount": money(300_000),
            "method": "BANK_TRANSFER"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let payout: Value = resp.json().await.unwrap();
    let payout_id = payout["payout_id"].as_str().unwrap();
    assert_eq!(payout["status"], "PENDING");

    // Vendors may not resolve their own payouts.
    let resp = vendor_headers(
        client.post(format!("{base}/payouts/{payout_id}/resolve")),
        &vendor_id,
    )
    .json(&json!({ "decision": "APPROVE" }))
    .send()
    .await
    .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = admin_headers(client.post(format!("{base}/payouts/{payout_id}/resolve")))
        .json(&json!({ "decision": "APPROVE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let payout: Value = resp.json().await.unwrap();
    assert_eq!(payout["status"], "COMPLETED");
    assert!(payout["resolved_utc"].is_string());

    let resp = client
        .get(format!("{base}/vendors/{vendor_id}/balance"))
        .send()
        .await
        .unwrap();
    let balance: Value = resp.json().await.unwrap();
    assert_eq!(balance["available"]["minor_units"], 200_000);
    assert_eq!(balance["total_paid_out"]["minor_units"], 300_000);
}

#[tokio::test]
async fn domain_errors_map_to_http_statuses() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let (vendor_id, order_id) = funded_vendor(&client, &base, 50_000).await;

    // Duplicate hold: conflict.
    let resp = client
        .post(format!("{base}/escrow/holds"))
        .json(&json!({
            "order_id": order_id,
            "vendor_id": vendor_id,
            "amount": money(50_000)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Second release: conflict.
    let resp = client
        .post(format!("{base}/escrow/holds/{order_id}/release"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Release for an unknown order: not found.
    let resp = client
        .post(format!("{base}/escrow/holds/{}/release", Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Overdrawn payout: unprocessable.
    let resp = vendor_headers(client.post(format!("{base}/payouts")), &vendor_id)
        .json(&json!({
            "vendor_id": vendor_id,
            "amount": money(999_999),
            "method": "BANK_TRANSFER"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    // Payout without actor headers: unauthorized.
    let resp = client
        .post(format!("{base}/payouts"))
        .json(&json!({
            "vendor_id": vendor_id,
            "amount": money(20_000),
            "method": "BANK_TRANSFER"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Payout for someone else's vendor: forbidden.
    let resp = vendor_headers(
        client.post(format!("{base}/payouts")),
        &Uuid::new_v4().to_string(),
    )
    .json(&json!({
        "vendor_id": vendor_id,
        "amount": money(20_000),
        "method": "BANK_TRANSFER"
    }))
    .send()
    .await
    .unwrap();
    assert_eq!(resp.status(), 403);

    // Skipping fulfillment stages: conflict.
    let resp = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "vendor_id": vendor_id,
            "customer_id": Uuid::new_v4(),
            "gross_amount": money(10_000),
            "deposit_amount": money(0)
        }))
        .send()
        .await
        .unwrap();
    let order: Value = resp.json().await.unwrap();
    let new_order = order["order_id"].as_str().unwrap();
    let resp = client
        .post(format!("{base}/orders/{new_order}/status"))
        .json(&json!({ "status": "COMPLETED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn payout_method_can_be_replaced() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let vendor_id = register_vendor(&client, &base).await;

    let resp = vendor_headers(
        client.put(format!("{base}/vendors/{vendor_id}/payout-method")),
        &vendor_id,
    )
    .json(&json!({ "kind": "PAYPAL", "email": "payouts@lensrentals.example" }))
    .send()
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    let vendor: Value = resp.json().await.unwrap();
    assert_eq!(vendor["payout_method"]["kind"], "PAYPAL");

    // Another vendor may not touch it.
    let resp = vendor_headers(
        client.put(format!("{base}/vendors/{vendor_id}/payout-method")),
        &Uuid::new_v4().to_string(),
    )
    .json(&json!({ "kind": "PAYPAL", "email": "attacker@example.com" }))
    .send()
    .await
    .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn platform_revenue_is_admin_only() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let (vendor_id, _) = funded_vendor(&client, &base, 100_000).await;

    let resp = vendor_headers(client.get(format!("{base}/platform/revenue")), &vendor_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = admin_headers(client.get(format!("{base}/platform/revenue")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let revenue: Value = resp.json().await.unwrap();
    // funded_vendor releases at a zero rate.
    assert_eq!(revenue["total_commission"]["minor_units"], 0);
    assert_eq!(revenue["total_commission"]["currency"], "INR");
}

#[tokio::test]
async fn vendor_validation_rejects_empty_name() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/vendors"))
        .json(&json!({ "display_name": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}
