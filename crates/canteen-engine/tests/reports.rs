//! Sales summary and best sellers.

mod common;

use canteen_core::{LineRequest, Money, PaymentMethod};
use canteen_engine::Canteen;
use common::*;

async fn settle(canteen: &Canteen, lines: &[LineRequest]) -> String {
    let order_id = canteen
        .orders()
        .create_order(BILLER, "guest", lines)
        .await
        .unwrap();
    canteen
        .settlement()
        .generate_bill(&order_id, PaymentMethod::Cash, None, 0, BILLER)
        .await
        .unwrap()
}

#[tokio::test]
async fn empty_canteen_reports_nothing() {
    let canteen = canteen().await;
    let settlement = canteen.settlement();

    let summary = settlement.sales_summary().await.unwrap();
    assert_eq!(summary.bill_count, 0);
    assert!(summary.total_sales.is_zero());
    assert!(settlement.top_items(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn refunded_bills_are_left_out() {
    let canteen = canteen().await;
    let tea = stocked_item(&canteen, "Tea", 10.0, 20).await;
    let samosa = stocked_item(&canteen, "Samosa", 12.5, 20).await;
    let vada = stocked_item(&canteen, "Vada Pav", 20.0, 20).await;

    settle(&canteen, &[LineRequest::new(&tea, 3), LineRequest::new(&samosa, 1)]).await;
    settle(&canteen, &[LineRequest::new(&samosa, 1), LineRequest::new(&tea, 1)]).await;
    let refunded = settle(&canteen, &[LineRequest::new(&vada, 10)]).await;

    // A pending order has no bill and does not count.
    canteen
        .orders()
        .create_order(BILLER, "guest", &[LineRequest::new(&vada, 5)])
        .await
        .unwrap();

    canteen.settlement().process_refund(&refunded, ADMIN).await.unwrap();

    let settlement = canteen.settlement();
    let summary = settlement.sales_summary().await.unwrap();
    assert_eq!(summary.bill_count, 2);
    // (42.5 + 22.5) * 1.08
    assert!(summary.total_sales.approx_eq(Money::new(70.2)));

    let top = settlement.top_items(5).await.unwrap();
    let ranked: Vec<_> = top.iter().map(|t| (t.name.as_str(), t.quantity)).collect();
    assert_eq!(ranked, vec![("Tea", 4), ("Samosa", 2)]);

    assert_eq!(settlement.top_items(1).await.unwrap().len(), 1);
}
