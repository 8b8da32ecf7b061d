//! HTTP-level tests: real handlers, real engine, real (throwaway) SQLite database.

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    App,
    Error,
};
use log::*;
use paygate_engine::{
    db_types::{NewOrder, NewPaymentLink, NewUser, Order, OrderStatus, PaymentMethod, Region},
    helpers::{new_order_reference, sign_fields},
    providers::{CallbackNotification, ProviderConfig},
    registry::GatewayRegistry,
    traits::PaymentStore,
    PaymentOrchestrator,
    ReconciliationApi,
    SignaturePolicy,
    SqliteDatabase,
};
use pg_common::{Money, Secret};
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::{
    data_objects::JsonResponse,
    routes::{
        create_payment,
        create_payment_default,
        gateway_callback,
        health,
        payment_methods,
        reconcile,
        reconcile_totals,
    },
};

const TEST_SECRET: &str = "s3cr3t";

async fn prepare_test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/paygate_server_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(&url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
    migrate!("../paygate_engine/src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    db
}

fn jkopay_config() -> ProviderConfig {
    let mut config = ProviderConfig::new(PaymentMethod::new("jkopay"), Region::new("TW"));
    config.enabled = true;
    config.currencies = vec!["TWD".to_string()];
    config.merchant_id = "M-001".to_string();
    config.terminal_id = "T-1".to_string();
    config.secret = Secret::new(TEST_SECRET.to_string());
    config.create_url = "https://uat.jkopay.example/v1/payments".to_string();
    config.return_url = "https://shop.example/return".to_string();
    config.notify_url = "https://shop.example/callback/TW/jkopay".to_string();
    config
}

async fn test_app(
    db: SqliteDatabase,
    policy: SignaturePolicy,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let registry = Arc::new(GatewayRegistry::build(vec![jkopay_config()]).expect("Error building registry"));
    let orchestrator = PaymentOrchestrator::new(db.clone(), registry, policy);
    let reconciler = ReconciliationApi::new(db, 5.0);
    let app = App::new()
        .app_data(web::Data::new(orchestrator))
        .app_data(web::Data::new(reconciler))
        .service(health)
        .service(payment_methods)
        .service(create_payment)
        .service(create_payment_default)
        .service(gateway_callback)
        .service(reconcile_totals)
        .service(reconcile);
    test::init_service(app).await
}

async fn seed_pending_order(db: &SqliteDatabase) -> Order {
    let user = db
        .insert_user(NewUser { name: "Ada".to_string(), email: format!("ada{}@example.com", rand::random::<u32>()) })
        .await
        .expect("Error inserting user");
    let link = db
        .insert_payment_link(NewPaymentLink::new(user.id, Money::from_major(102), "TWD", "jkopay".into()))
        .await
        .expect("Error inserting payment link");
    let order_id = new_order_reference(&link.id);
    db.insert_order(NewOrder::new(order_id, user.id, link.amount, &link.currency).for_link(&link))
        .await
        .expect("Error inserting order")
}

fn signed_callback(order_no: &str, tx_id: &str, resp_code: &str, amount: &str) -> CallbackNotification {
    let mut cb = CallbackNotification {
        merchant_id: "M-001".to_string(),
        terminal_id: "T-1".to_string(),
        order_no: order_no.to_string(),
        resp_code: resp_code.to_string(),
        resp_msg: "Test".to_string(),
        amount: amount.to_string(),
        currency_code: "TWD".to_string(),
        tx_id: tx_id.to_string(),
        tx_type: "Sale".to_string(),
        signature: String::new(),
    };
    let fields = [
        ("MerchantID", cb.merchant_id.as_str()),
        ("TerminalID", cb.terminal_id.as_str()),
        ("OrderNo", cb.order_no.as_str()),
        ("TxID", cb.tx_id.as_str()),
        ("RespCode", cb.resp_code.as_str()),
        ("Amount", cb.amount.as_str()),
        ("CurrencyCode", cb.currency_code.as_str()),
    ];
    cb.signature = sign_fields(&fields, &Secret::new(TEST_SECRET.to_string()));
    cb
}

#[actix_web::test]
async fn health_check() {
    let db = prepare_test_db().await;
    let app = test_app(db, SignaturePolicy::Reject).await;
    let req = TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn methods_endpoint_lists_enabled_providers() {
    let db = prepare_test_db().await;
    let app = test_app(db, SignaturePolicy::Reject).await;

    let req = TestRequest::get().uri("/payments/TW/methods").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["methods"], serde_json::json!(["jkopay"]));
    assert_eq!(body["default_method"], "jkopay");
    assert_eq!(body["currencies"], serde_json::json!(["TWD"]));

    let req = TestRequest::get().uri("/payments/SG/methods").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["methods"], serde_json::json!([]));
    assert!(body["default_method"].is_null());
}

#[actix_web::test]
async fn callback_settles_order_and_always_returns_200() {
    let db = prepare_test_db().await;
    let order = seed_pending_order(&db).await;
    let app = test_app(db.clone(), SignaturePolicy::Reject).await;

    let cb = signed_callback(order.id.as_str(), "JKO-100", "000", "102");
    let req = TestRequest::post().uri("/callback/TW/jkopay").set_form(&cb).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonResponse = test::read_body_json(res).await;
    assert!(body.success);

    let order = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}

#[actix_web::test]
async fn rejected_callback_still_gets_200_but_changes_nothing() {
    let db = prepare_test_db().await;
    let order = seed_pending_order(&db).await;
    let app = test_app(db.clone(), SignaturePolicy::Reject).await;

    let mut cb = signed_callback(order.id.as_str(), "JKO-101", "000", "102");
    cb.signature = "00".repeat(32);
    let req = TestRequest::post().uri("/callback/TW/jkopay").set_form(&cb).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonResponse = test::read_body_json(res).await;
    assert!(!body.success);

    let order = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[actix_web::test]
async fn query_encoded_callbacks_are_accepted() {
    let db = prepare_test_db().await;
    let order = seed_pending_order(&db).await;
    let app = test_app(db.clone(), SignaturePolicy::Reject).await;

    let cb = signed_callback(order.id.as_str(), "JKO-102", "000", "102");
    let query = serde_urlencoded::to_string(&cb).expect("Error encoding callback");
    let req = TestRequest::post().uri(&format!("/callback/TW/jkopay?{query}")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonResponse = test::read_body_json(res).await;
    assert!(body.success);

    let order = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}

#[actix_web::test]
async fn create_payment_failures_are_typed() {
    let db = prepare_test_db().await;
    let app = test_app(db, SignaturePolicy::Reject).await;

    let params = serde_json::json!({ "link_id": "pl_00000000" });
    let req = TestRequest::post().uri("/payments/TW/jkopay").set_json(&params).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: JsonResponse = test::read_body_json(res).await;
    assert!(!body.success);

    // A region with no providers has no default method either.
    let req = TestRequest::post().uri("/payments/SG").set_json(&params).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn reconcile_endpoints_report_on_the_live_database() {
    let db = prepare_test_db().await;
    let order = seed_pending_order(&db).await;
    let app = test_app(db.clone(), SignaturePolicy::Reject).await;

    let cb = signed_callback(order.id.as_str(), "JKO-103", "000", "102");
    let req = TestRequest::post().uri("/callback/TW/jkopay").set_form(&cb).to_request();
    test::call_service(&app, req).await;

    let req = TestRequest::get().uri("/reconcile").to_request();
    let report: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["overall"], "Healthy");
    assert_eq!(report["checks"].as_array().unwrap().len(), 5);

    let req = TestRequest::get().uri("/reconcile/totals").to_request();
    let totals: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(totals["order_count"], 1);
    assert_eq!(totals["total_sales"], 10_200);
    assert_eq!(totals["platform_fee"], 510);
    assert_eq!(totals["net_revenue"], 9_690);
}
