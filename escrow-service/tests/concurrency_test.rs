//! Races that must never overdraw or double-apply.

mod common;

use common::{completed_order, fund_vendor, inr, ledger, vendor_with_bank};
use escrow_service::error::LedgerError;
use escrow_service::models::{EntryType, PayoutMethod};
use rust_decimal::Decimal;

#[tokio::test]
async fn concurrent_payout_requests_never_overdraw() {
    let l = ledger();
    let vendor_id = vendor_with_bank(&l).await;
    fund_vendor(&l, vendor_id, 100_000).await;

    // Ten requests for Rs 300 each against Rs 1,000: at most three can win.
    let mut handles = Vec::new();
    for _ in 0..10 {
        let payouts = l.payouts.clone();
        handles.push(tokio::spawn(async move {
            payouts
                .request_payout(vendor_id, inr(30_000), PayoutMethod::BankTransfer)
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientBalance { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(succeeded, 3);

    let balance = l.balances.vendor_balance(vendor_id).await.unwrap();
    assert_eq!(balance.reserved, inr(90_000));
    assert_eq!(balance.available, inr(10_000));
    assert!(balance.available.minor_units >= 0);
}

#[tokio::test]
async fn concurrent_releases_apply_exactly_once() {
    let l = ledger();
    let vendor_id = vendor_with_bank(&l).await;
    let order_id = completed_order(&l, vendor_id, 50_000, Decimal::new(10, 2)).await;
    l.escrow
        .create_hold(order_id, vendor_id, inr(50_000))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let escrow = l.escrow.clone();
        handles.push(tokio::spawn(async move { escrow.release_hold(order_id).await }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::AlreadyClosed(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(succeeded, 1);

    let entries = l.escrow.entries_for_order(order_id).await.unwrap();
    let releases = entries
        .iter()
        .filter(|e| e.entry_type == EntryType::EscrowRelease)
        .count();
    assert_eq!(releases, 1);

    let balance = l.balances.vendor_balance(vendor_id).await.unwrap();
    assert_eq!(balance.available, inr(45_000), "credited exactly once");
}

#[tokio::test]
async fn racing_release_and_refund_close_the_hold_exactly_once() {
    // A release and a refund must never both drain the hold. Repeat the
    // race a few times since the interleaving varies per run.
    for _ in 0..20 {
        let l = ledger();
        let vendor_id = vendor_with_bank(&l).await;
        let order_id = completed_order(&l, vendor_id, 10_000, Decimal::new(10, 2)).await;
        l.escrow
            .create_hold(order_id, vendor_id, inr(10_000))
            .await
            .unwrap();

        let release = {
            let escrow = l.escrow.clone();
            tokio::spawn(async move { escrow.release_hold(order_id).await })
        };
        let refund = {
            let escrow = l.escrow.clone();
            tokio::spawn(async move { escrow.refund_hold(order_id).await })
        };

        let released = release.await.unwrap().is_ok();
        let refunded = refund.await.unwrap().is_ok();
        assert!(
            released ^ refunded,
            "exactly one closure must win, got release={released} refund={refunded}"
        );

        let entries = l.escrow.entries_for_order(order_id).await.unwrap();
        let drained: i64 = entries
            .iter()
            .filter(|e| e.entry_type != EntryType::EscrowHold)
            .map(|e| e.amount.minor_units)
            .sum();
        assert_eq!(drained, 10_000, "hold drained exactly once");

        let balance = l.balances.vendor_balance(vendor_id).await.unwrap();
        assert_eq!(balance.pending_escrow, inr(0));
        assert_eq!(balance.available, if released { inr(9_000) } else { inr(0) });
    }
}

#[tokio::test]
async fn concurrent_holds_apply_exactly_once() {
    let l = ledger();
    let vendor_id = vendor_with_bank(&l).await;
    let order_id = completed_order(&l, vendor_id, 20_000, Decimal::ZERO).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let escrow = l.escrow.clone();
        handles.push(tokio::spawn(async move {
            escrow.create_hold(order_id, vendor_id, inr(20_000)).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::DuplicateHold(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(succeeded, 1);

    let entries = l.escrow.entries_for_order(order_id).await.unwrap();
    assert_eq!(entries.len(), 1);
}
