//! End-to-end tests for the callback state machine against a real SQLite database.

mod support;

use paygate_engine::{
    db_types::{LinkId, LinkStatus, NewOrder, OrderStatus, PaymentStatus, Region},
    helpers::new_order_reference,
    traits::{PaymentStore, ReconciliationStore},
    GatewayError,
    SignaturePolicy,
};
use pg_common::Money;
use support::*;

#[tokio::test]
async fn successful_callback_settles_the_order() {
    let db = prepare_test_env(&random_db_path()).await;
    let (_, link, order) = seed_pending_order(&db, 102).await;
    let orchestrator = orchestrator(db.clone(), SignaturePolicy::Reject);

    let cb = signed_callback(order.id.as_str(), "JKO-1001", "000", "102");
    let outcome = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb).await.unwrap();
    assert!(outcome.success);
    assert!(outcome.newly_applied);
    assert_eq!(outcome.amount, Money::from_major(102));

    let order = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.provider_tx_id.as_deref(), Some("JKO-1001"));
    assert!(order.completed_at.is_some());

    let payment = db.fetch_payment_by_provider_tx(&order.id, "JKO-1001").await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, Money::from_major(102));
    assert!(payment.verified);

    let link = db.fetch_payment_link(&link.id).await.unwrap().unwrap();
    assert_eq!(link.status, LinkStatus::Completed);
    assert_eq!(link.usage_count, 1);
}

#[tokio::test]
async fn declined_callback_cancels_the_order() {
    let db = prepare_test_env(&random_db_path()).await;
    let (_, link, order) = seed_pending_order(&db, 50).await;
    let orchestrator = orchestrator(db.clone(), SignaturePolicy::Reject);

    let cb = signed_callback(order.id.as_str(), "JKO-2001", "D99", "50");
    let outcome = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb).await.unwrap();
    assert!(!outcome.success);

    let order = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(order.completed_at.is_none());

    let payment = db.fetch_payment_by_provider_tx(&order.id, "JKO-2001").await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);

    let link = db.fetch_payment_link(&link.id).await.unwrap().unwrap();
    assert_eq!(link.status, LinkStatus::Failed);
    assert_eq!(link.usage_count, 0);
}

#[tokio::test]
async fn redelivered_callback_is_a_no_op() {
    let db = prepare_test_env(&random_db_path()).await;
    let (_, _, order) = seed_pending_order(&db, 102).await;
    let orchestrator = orchestrator(db.clone(), SignaturePolicy::Reject);

    let cb = signed_callback(order.id.as_str(), "JKO-3001", "000", "102");
    let first = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb.clone()).await.unwrap();
    let second = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb).await.unwrap();

    assert!(first.newly_applied);
    assert!(!second.newly_applied);
    assert_eq!(first.payment_id, second.payment_id);

    // Exactly one payment row, one terminal transition.
    let payments = db.fetch_all_payments().await.unwrap();
    assert_eq!(payments.len(), 1);
    let order = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}

#[tokio::test]
async fn bad_signature_is_rejected_without_mutating_state() {
    let db = prepare_test_env(&random_db_path()).await;
    let (_, _, order) = seed_pending_order(&db, 102).await;
    let orchestrator = orchestrator(db.clone(), SignaturePolicy::Reject);

    let mut cb = signed_callback(order.id.as_str(), "JKO-4001", "000", "102");
    cb.amount = "999".to_string();
    let err = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb).await.unwrap_err();
    assert!(matches!(err, GatewayError::SignatureMismatch));

    let order = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(db.fetch_all_payments().await.unwrap().is_empty());
}

#[tokio::test]
async fn accept_unverified_policy_flags_the_payment_for_review() {
    let db = prepare_test_env(&random_db_path()).await;
    let (_, _, order) = seed_pending_order(&db, 102).await;
    let orchestrator = orchestrator(db.clone(), SignaturePolicy::AcceptUnverified);

    let mut cb = signed_callback(order.id.as_str(), "JKO-5001", "000", "102");
    cb.signature = "00".repeat(32);
    let outcome = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb).await.unwrap();
    assert!(outcome.success);

    let payment = db.fetch_payment_by_provider_tx(&order.id, "JKO-5001").await.unwrap().unwrap();
    assert!(!payment.verified);
    let order = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}

#[tokio::test]
async fn callback_for_unknown_order_is_a_typed_failure() {
    let db = prepare_test_env(&random_db_path()).await;
    let (_, link, _) = seed_pending_order(&db, 102).await;
    let orchestrator = orchestrator(db.clone(), SignaturePolicy::Reject);

    // The link exists but this particular payment attempt was never recorded.
    let cb = signed_callback(&format!("{}_ffffffff", link.id), "JKO-6001", "000", "102");
    let err = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb).await.unwrap_err();
    assert!(matches!(err, GatewayError::OrderNotFound(_)));

    // A reference whose link was never issued at all.
    let cb = signed_callback("pl_deadbeef_0001", "JKO-6002", "000", "102");
    let err = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb).await.unwrap_err();
    assert!(matches!(err, GatewayError::PaymentLinkNotFound(_)));

    // A reference that does not carry a link-id prefix is rejected before any lookup.
    let cb = signed_callback("garbage", "JKO-6003", "000", "102");
    let err = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidOrderReference(_)));
}

#[tokio::test]
async fn callback_for_order_with_missing_link_is_refused() {
    let db = prepare_test_env(&random_db_path()).await;
    let (user, _, _) = seed_pending_order(&db, 10).await;
    let orchestrator = orchestrator(db.clone(), SignaturePolicy::Reject);

    // An order row whose link was never persisted.
    let ghost_link = LinkId("pl_0badf00d".to_string());
    let mut new_order = NewOrder::new(new_order_reference(&ghost_link), user.id, Money::from_major(77), "TWD");
    new_order.payment_link_id = Some(ghost_link);
    new_order.method = Some("jkopay".into());
    let order = db.insert_order(new_order).await.unwrap();

    let cb = signed_callback(order.id.as_str(), "JKO-8001", "000", "77");
    let err = orchestrator.handle_callback(&Region::new("TW"), &"jkopay".into(), cb).await.unwrap_err();
    assert!(matches!(err, GatewayError::PaymentLinkNotFound(_)));

    // Nothing was settled: the order stays claimable and no payment was recorded.
    let order = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(db.fetch_all_payments().await.unwrap().is_empty());
}

#[tokio::test]
async fn callback_for_unconfigured_provider_is_rejected() {
    let db = prepare_test_env(&random_db_path()).await;
    let orchestrator = orchestrator(db.clone(), SignaturePolicy::Reject);
    let cb = signed_callback("pl_deadbeef_0001", "JKO-7001", "000", "102");
    let err = orchestrator.handle_callback(&Region::new("SG"), &"jkopay".into(), cb).await.unwrap_err();
    assert!(matches!(err, GatewayError::NoProviderAvailable { .. }));
}

#[tokio::test]
async fn create_payment_validation_happens_before_any_network_call() {
    let db = prepare_test_env(&random_db_path()).await;
    let (user, _, _) = seed_pending_order(&db, 10).await;
    let orchestrator = orchestrator(db.clone(), SignaturePolicy::Reject);
    let customer = paygate_engine::providers::CustomerInfo::default();

    // Unknown link.
    let err = orchestrator
        .create_payment(&Region::new("TW"), None, &"pl_00000000".to_string().into(), customer.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::PaymentLinkNotFound(_)));

    // Currency the provider does not accept.
    let link = db
        .insert_payment_link(
            paygate_engine::db_types::NewPaymentLink::new(user.id, Money::from_major(10), "USD", "jkopay".into()),
        )
        .await
        .unwrap();
    let err = orchestrator.create_payment(&Region::new("TW"), None, &link.id, customer.clone()).await.unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedCurrency { .. }));

    // Region with no provider at all.
    let err = orchestrator.create_payment(&Region::new("SG"), None, &link.id, customer).await.unwrap_err();
    assert!(matches!(err, GatewayError::NoDefaultMethod(_)));
}
