//! Bill generation: pricing, payment, loyalty.

mod common;

use std::collections::BTreeSet;

use chrono::{Duration, Utc};

use canteen_core::{
    CoreError, DiscountDraft, DiscountKind, ErrorKind, LineRequest, LoyaltyReason, Money,
    OrderStatus, PaymentMethod, WalletEntryReason,
};
use canteen_engine::Canteen;
use common::*;

async fn guest_tea_order(canteen: &Canteen) -> String {
    let tea = stocked_item(canteen, "Tea", 10.0, 5).await;
    canteen
        .orders()
        .create_order(BILLER, "guest", &[LineRequest::new(&tea, 2)])
        .await
        .unwrap()
}

fn discount(kind: DiscountKind, value: f64, combo: &[&str]) -> DiscountDraft {
    let now = Utc::now();
    DiscountDraft {
        name: "Promo".to_string(),
        kind,
        value,
        starts_at: now - Duration::hours(1),
        ends_at: now + Duration::hours(1),
        combo_item_ids: combo.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
    }
}

#[tokio::test]
async fn cash_bill_adds_tax_and_completes_order() {
    let canteen = canteen().await;
    let order_id = guest_tea_order(&canteen).await;

    let bill_id = canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Cash, None, 0, BILLER)
        .await
        .unwrap();

    let bill = canteen.settlement().bill(&bill_id).await.unwrap();
    assert!(bill.subtotal.approx_eq(Money::new(20.0)));
    assert!(bill.tax.approx_eq(Money::new(1.6)));
    assert!(bill.total.approx_eq(Money::new(21.6)));
    assert!(!bill.refunded);
    assert_eq!(bill.issued_by, BILLER);
    assert_eq!(bill.payment_method, PaymentMethod::Cash);

    let order = canteen.orders().order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    let by_order = canteen.settlement().bill_for_order(&order_id).await.unwrap();
    assert_eq!(by_order.map(|b| b.id), Some(bill_id));
}

#[tokio::test]
async fn second_settlement_is_refused() {
    let canteen = canteen().await;
    let order_id = guest_tea_order(&canteen).await;
    let settlement = canteen.settlement();

    settlement
        .generate_bill(&order_id, PaymentMethod::Cash, None, 0, BILLER)
        .await
        .unwrap();
    let err = settlement
        .generate_bill(&order_id, PaymentMethod::Card, None, 0, BILLER)
        .await
        .unwrap_err();

    assert!(matches!(err.as_core(), Some(CoreError::OrderNotSettleable { .. })));
    assert_eq!(settlement.bills().await.unwrap().len(), 1);

    let err = settlement
        .generate_bill("missing", PaymentMethod::Cash, None, 0, BILLER)
        .await
        .unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::OrderNotSettleable { .. })));
}

#[tokio::test]
async fn concurrent_settlements_claim_once() {
    let canteen = canteen().await;
    let order_id = guest_tea_order(&canteen).await;

    let first = canteen.settlement();
    let second = canteen.settlement();
    let (a, b) = tokio::join!(
        first.generate_bill(&order_id, PaymentMethod::Cash, None, 0, BILLER),
        second.generate_bill(&order_id, PaymentMethod::Card, None, 0, BILLER),
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(canteen.settlement().bills().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pooled_settlements_claim_each_order_once() {
    let dir = tempfile::tempdir().unwrap();
    let canteen = file_canteen(dir.path(), 4).await;
    let tea = stocked_item(&canteen, "Tea", 10.0, 50).await;

    for _ in 0..10 {
        let order_id = canteen
            .orders()
            .create_order(BILLER, MEMBER, &[LineRequest::new(&tea, 1)])
            .await
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let canteen = canteen.clone();
                let order_id = order_id.clone();
                tokio::spawn(async move {
                    canteen
                        .settlement()
                        .generate_bill(&order_id, PaymentMethod::Cash, None, 0, BILLER)
                        .await
                })
            })
            .collect();

        let mut settled = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => settled += 1,
                Err(err) => assert!(
                    matches!(err.as_core(), Some(CoreError::OrderNotSettleable { .. })),
                    "unexpected: {err}"
                ),
            }
        }
        assert_eq!(settled, 1);

        let order = canteen.orders().order(&order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }

    assert_eq!(canteen.settlement().bills().await.unwrap().len(), 10);
    // One point per bill of 10.8 at the default earn rate.
    let points = canteen.ledger().loyalty_points(MEMBER).await.unwrap();
    assert_eq!(points, 10);
    assert_eq!(points, loyalty_ledger_sum(&canteen, MEMBER).await);
}

#[tokio::test]
async fn short_wallet_leaves_everything_untouched() {
    let canteen = canteen().await;
    let tea = stocked_item(&canteen, "Tea", 10.0, 5).await;
    canteen
        .ledger()
        .create_wallet(ADMIN, WALLET_PHONE, Money::new(5.0))
        .await
        .unwrap();

    let order_id = canteen
        .orders()
        .create_order(BILLER, WALLET_PHONE, &[LineRequest::new(&tea, 2)])
        .await
        .unwrap();

    let err = canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Wallet, None, 0, BILLER)
        .await
        .unwrap_err();
    match err.as_core() {
        Some(CoreError::InsufficientFunds { balance, required, .. }) => {
            assert!(balance.approx_eq(Money::new(5.0)));
            assert!(required.approx_eq(Money::new(21.6)));
        }
        other => panic!("unexpected: {other:?}"),
    }

    let order = canteen.orders().order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    let balance = canteen.ledger().wallet_balance(WALLET_PHONE).await.unwrap();
    assert!(balance.approx_eq(Money::new(5.0)));
    assert!(canteen.settlement().bills().await.unwrap().is_empty());

    // Still settleable another way.
    canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Cash, None, 0, BILLER)
        .await
        .unwrap();
}

#[tokio::test]
async fn wallet_payment_debits_and_records() {
    let canteen = canteen().await;
    let tea = stocked_item(&canteen, "Tea", 10.0, 5).await;
    canteen
        .ledger()
        .create_wallet(ADMIN, WALLET_PHONE, Money::new(100.0))
        .await
        .unwrap();
    let order_id = canteen
        .orders()
        .create_order(BILLER, WALLET_PHONE, &[LineRequest::new(&tea, 2)])
        .await
        .unwrap();

    let bill_id = canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Wallet, None, 0, BILLER)
        .await
        .unwrap();

    let balance = canteen.ledger().wallet_balance(WALLET_PHONE).await.unwrap();
    assert!(balance.approx_eq(Money::new(78.4)));

    let history = canteen.ledger().wallet_history(WALLET_PHONE).await.unwrap();
    let payment = history.last().unwrap();
    assert_eq!(payment.reason, WalletEntryReason::Payment);
    assert_eq!(payment.reference.as_deref(), Some(bill_id.as_str()));
    assert!(payment.delta.approx_eq(Money::new(-21.6)));
}

#[tokio::test]
async fn guest_wallet_bill_skips_the_debit() {
    let canteen = canteen().await;
    let order_id = guest_tea_order(&canteen).await;

    let bill_id = canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Wallet, None, 0, BILLER)
        .await
        .unwrap();

    let bill = canteen.settlement().bill(&bill_id).await.unwrap();
    assert_eq!(bill.payment_method, PaymentMethod::Wallet);
    assert!(bill.total.approx_eq(Money::new(21.6)));

    let order = canteen.orders().order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    let ledger = canteen.ledger();
    assert!(ledger.wallets().await.unwrap().is_empty());
    assert!(ledger.wallet_history("guest").await.unwrap().is_empty());
    assert!(ledger.loyalty_history(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn redemption_reduces_pre_tax_amount() {
    let canteen = canteen().await;
    let thali = stocked_item(&canteen, "Veg Thali", 50.0, 10).await;
    let ledger = canteen.ledger();
    ledger.earn_loyalty(BILLER, MEMBER, Money::new(200.0)).await.unwrap();
    assert_eq!(ledger.loyalty_points(MEMBER).await.unwrap(), 20);

    let order_id = canteen
        .orders()
        .create_order(BILLER, MEMBER, &[LineRequest::new(&thali, 2)])
        .await
        .unwrap();
    let bill_id = canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Cash, None, 10, BILLER)
        .await
        .unwrap();

    let bill = canteen.settlement().bill(&bill_id).await.unwrap();
    assert_eq!(bill.points_redeemed, 10);
    assert!(bill.loyalty_discount.approx_eq(Money::new(1.0)));
    assert!(bill.subtotal.approx_eq(Money::new(99.0)));
    assert!(bill.total.approx_eq(Money::new(106.92)));

    let history = ledger.loyalty_history(Some(MEMBER)).await.unwrap();
    assert!(history
        .iter()
        .any(|e| e.reason == LoyaltyReason::Redeemed && e.delta == -10));

    // 20 - 10 redeemed + floor(106.92 / 10) earned
    assert_eq!(ledger.loyalty_points(MEMBER).await.unwrap(), 20);
    assert_eq!(loyalty_ledger_sum(&canteen, MEMBER).await, 20);
}

#[tokio::test]
async fn failed_redemption_aborts_settlement() {
    let canteen = canteen().await;
    let tea = stocked_item(&canteen, "Tea", 10.0, 5).await;
    let order_id = canteen
        .orders()
        .create_order(BILLER, MEMBER, &[LineRequest::new(&tea, 2)])
        .await
        .unwrap();
    let settlement = canteen.settlement();

    let err = settlement
        .generate_bill(&order_id, PaymentMethod::Cash, None, 10, BILLER)
        .await
        .unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::InsufficientPoints { .. })));

    let err = settlement
        .generate_bill(&order_id, PaymentMethod::Cash, None, 5, BILLER)
        .await
        .unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::BelowRedemptionMinimum { .. })));

    let order = canteen.orders().order(&order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn guests_earn_no_points() {
    let canteen = canteen().await;
    let order_id = guest_tea_order(&canteen).await;
    canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Cash, None, 50, BILLER)
        .await
        .unwrap();

    assert!(canteen.ledger().loyalty_accounts().await.unwrap().is_empty());
    assert!(canteen.ledger().loyalty_history(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn combo_applies_only_when_every_item_is_ordered() {
    let canteen = canteen().await;
    let tea = stocked_item(&canteen, "Tea", 10.0, 10).await;
    let samosa = stocked_item(&canteen, "Samosa", 12.0, 10).await;
    let combo_id = canteen
        .discounts()
        .add(MANAGER, discount(DiscountKind::Combo, 4.0, &[&tea, &samosa]))
        .await
        .unwrap();

    let orders = canteen.orders();
    let settlement = canteen.settlement();

    let both = orders
        .create_order(
            BILLER,
            "guest",
            &[LineRequest::new(&tea, 1), LineRequest::new(&samosa, 1)],
        )
        .await
        .unwrap();
    let bill_id = settlement
        .generate_bill(&both, PaymentMethod::Cash, Some(&combo_id), 0, BILLER)
        .await
        .unwrap();
    let bill = settlement.bill(&bill_id).await.unwrap();
    assert!(bill.discount_amount.approx_eq(Money::new(4.0)));
    assert!(bill.subtotal.approx_eq(Money::new(18.0)));

    let tea_only = orders
        .create_order(BILLER, "guest", &[LineRequest::new(&tea, 2)])
        .await
        .unwrap();
    let bill_id = settlement
        .generate_bill(&tea_only, PaymentMethod::Cash, Some(&combo_id), 0, BILLER)
        .await
        .unwrap();
    let bill = settlement.bill(&bill_id).await.unwrap();
    assert!(bill.discount_amount.is_zero());
    assert!(bill.total.approx_eq(Money::new(21.6)));
}

#[tokio::test]
async fn missing_or_expired_discount_is_skipped() {
    let canteen = canteen().await;
    let tea = stocked_item(&canteen, "Tea", 10.0, 10).await;

    let mut expired = discount(DiscountKind::Percentage, 50.0, &[]);
    expired.starts_at = Utc::now() - Duration::days(2);
    expired.ends_at = Utc::now() - Duration::days(1);
    let expired_id = canteen.discounts().add(MANAGER, expired).await.unwrap();

    for discount_id in [expired_id.as_str(), "no-such-discount"] {
        let order_id = canteen
            .orders()
            .create_order(BILLER, "guest", &[LineRequest::new(&tea, 2)])
            .await
            .unwrap();
        let bill_id = canteen
            .settlement()
            .generate_bill(&order_id, PaymentMethod::Cash, Some(discount_id), 0, BILLER)
            .await
            .unwrap();
        let bill = canteen.settlement().bill(&bill_id).await.unwrap();
        assert!(bill.discount_amount.is_zero());
        assert!(bill.total.approx_eq(Money::new(21.6)));
    }
}

#[tokio::test]
async fn percentage_and_fixed_discounts() {
    let canteen = canteen().await;
    let tea = stocked_item(&canteen, "Tea", 10.0, 10).await;
    let book = canteen.discounts();
    let ten_pct = book.add(MANAGER, discount(DiscountKind::Percentage, 10.0, &[])).await.unwrap();
    let huge = book.add(MANAGER, discount(DiscountKind::Fixed, 500.0, &[])).await.unwrap();

    let order_id = canteen
        .orders()
        .create_order(BILLER, "guest", &[LineRequest::new(&tea, 2)])
        .await
        .unwrap();
    let bill_id = canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Cash, Some(&ten_pct), 0, BILLER)
        .await
        .unwrap();
    let bill = canteen.settlement().bill(&bill_id).await.unwrap();
    assert!(bill.subtotal.approx_eq(Money::new(18.0)));
    assert!(bill.total.approx_eq(Money::new(19.44)));

    // Fixed reduction floors the amount at zero.
    let order_id = canteen
        .orders()
        .create_order(BILLER, "guest", &[LineRequest::new(&tea, 2)])
        .await
        .unwrap();
    let bill_id = canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Cash, Some(&huge), 0, BILLER)
        .await
        .unwrap();
    let bill = canteen.settlement().bill(&bill_id).await.unwrap();
    assert!(bill.total.is_zero());
}

#[tokio::test]
async fn tax_rate_setting_is_applied() {
    let canteen = canteen().await;
    canteen.settings().set_tax_rate(ADMIN, 0.05).await.unwrap();
    let order_id = guest_tea_order(&canteen).await;

    let bill_id = canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Cash, None, 0, BILLER)
        .await
        .unwrap();
    let bill = canteen.settlement().bill(&bill_id).await.unwrap();
    assert!(bill.tax.approx_eq(Money::new(1.0)));
    assert!(bill.total.approx_eq(Money::new(21.0)));
}

#[tokio::test]
async fn loyalty_balance_tracks_its_ledger() {
    let canteen = canteen().await;
    let thali = stocked_item(&canteen, "Veg Thali", 70.0, 20).await;

    for points in [0, 10, 0, 20] {
        let order_id = canteen
            .orders()
            .create_order(BILLER, MEMBER, &[LineRequest::new(&thali, 2)])
            .await
            .unwrap();
        canteen
            .settlement()
            .generate_bill(&order_id, PaymentMethod::Card, None, points, BILLER)
            .await
            .unwrap();

        let points_now = canteen.ledger().loyalty_points(MEMBER).await.unwrap();
        assert!(points_now >= 0);
        assert_eq!(points_now, loyalty_ledger_sum(&canteen, MEMBER).await);
    }
}

#[tokio::test]
async fn settling_requires_an_operator() {
    let canteen = canteen().await;
    let order_id = guest_tea_order(&canteen).await;

    let err = canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Cash, None, 0, "stranger")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn quote_previews_without_side_effects() {
    let canteen = canteen().await;
    let order_id = guest_tea_order(&canteen).await;
    let order = canteen.orders().order(&order_id).await.unwrap();

    let priced = canteen.pricing().quote(&order, None).await.unwrap();
    assert!(priced.total.approx_eq(Money::new(21.6)));
    assert_eq!(
        canteen.orders().order(&order_id).await.unwrap().status,
        OrderStatus::Pending
    );
}
