//! Balance aggregation tests: every figure is replayed from the ledger.

mod common;

use common::{admin, fund_vendor, inr, ledger, vendor_with_bank};
use escrow_service::models::{PayoutDecision, PayoutMethod};
use rust_decimal::Decimal;

#[tokio::test]
async fn fresh_vendor_has_all_zero_balances() {
    let l = ledger();
    let vendor_id = vendor_with_bank(&l).await;

    let balance = l.balances.vendor_balance(vendor_id).await.unwrap();
    assert_eq!(balance.available, inr(0));
    assert_eq!(balance.pending_escrow, inr(0));
    assert_eq!(balance.total_paid_out, inr(0));
    assert_eq!(balance.reserved, inr(0));
}

#[tokio::test]
async fn refund_removes_pending_escrow_without_touching_available() {
    let l = ledger();
    let vendor_id = vendor_with_bank(&l).await;
    fund_vendor(&l, vendor_id, 100_000).await;

    let order_id = common::completed_order(&l, vendor_id, 40_000, Decimal::ZERO).await;
    l.escrow
        .create_hold(order_id, vendor_id, inr(40_000))
        .await
        .unwrap();

    let balance = l.balances.vendor_balance(vendor_id).await.unwrap();
    assert_eq!(balance.pending_escrow, inr(40_000));
    assert_eq!(balance.available, inr(100_000));

    l.escrow.refund_hold(order_id).await.unwrap();

    let balance = l.balances.vendor_balance(vendor_id).await.unwrap();
    assert_eq!(balance.pending_escrow, inr(0));
    assert_eq!(balance.available, inr(100_000), "refund never credits the vendor");
}

#[tokio::test]
async fn commission_is_platform_revenue_not_vendor_balance() {
    let l = ledger();
    let vendor_id = vendor_with_bank(&l).await;

    // Rs 2,000 at 25% commission.
    let order_id = common::completed_order(&l, vendor_id, 200_000, Decimal::new(25, 2)).await;
    l.escrow
        .create_hold(order_id, vendor_id, inr(200_000))
        .await
        .unwrap();
    l.escrow.release_hold(order_id).await.unwrap();

    let balance = l.balances.vendor_balance(vendor_id).await.unwrap();
    assert_eq!(balance.available, inr(150_000));
    assert_eq!(balance.pending_escrow, inr(0));

    let revenue = l.balances.platform_revenue().await.unwrap();
    assert_eq!(revenue, inr(50_000));
}

#[tokio::test]
async fn conservation_holds_across_the_full_lifecycle() {
    let l = ledger();
    let vendor_id = vendor_with_bank(&l).await;

    // Three releases, one pending payout, one completed payout.
    fund_vendor(&l, vendor_id, 300_000).await;
    fund_vendor(&l, vendor_id, 120_000).await;
    fund_vendor(&l, vendor_id, 80_000).await;
    let total_released = 500_000;

    let approved = l
        .payouts
        .request_payout(vendor_id, inr(150_000), PayoutMethod::BankTransfer)
        .await
        .unwrap();
    l.payouts
        .resolve_payout(approved.payout_id, PayoutDecision::Approve, &admin())
        .await
        .unwrap();
    l.payouts
        .request_payout(vendor_id, inr(100_000), PayoutMethod::BankTransfer)
        .await
        .unwrap();

    let balance = l.balances.vendor_balance(vendor_id).await.unwrap();
    assert_eq!(
        balance.available.minor_units
            + balance.reserved.minor_units
            + balance.total_paid_out.minor_units,
        total_released
    );
    assert_eq!(balance.available, inr(250_000));
    assert_eq!(balance.reserved, inr(100_000));
    assert_eq!(balance.total_paid_out, inr(150_000));
}

#[tokio::test]
async fn balances_are_per_vendor() {
    let l = ledger();
    let first = vendor_with_bank(&l).await;
    let second = vendor_with_bank(&l).await;

    fund_vendor(&l, first, 70_000).await;
    fund_vendor(&l, second, 30_000).await;

    let a = l.balances.vendor_balance(first).await.unwrap();
    let b = l.balances.vendor_balance(second).await.unwrap();
    assert_eq!(a.available, inr(70_000));
    assert_eq!(b.available, inr(30_000));
}
