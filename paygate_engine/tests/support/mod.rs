//! Shared harness for the integration tests: a throwaway SQLite database per test, a one-provider registry, and
//! helpers to seed the order/link/user rows the callback state machine operates on.
#![allow(dead_code)]

use std::sync::Arc;

use log::*;
use paygate_engine::{
    db_types::{NewOrder, NewPaymentLink, NewUser, Order, PaymentLink, PaymentMethod, Region, User},
    helpers::{new_order_reference, sign_fields},
    providers::{CallbackNotification, ProviderConfig},
    registry::GatewayRegistry,
    traits::PaymentStore,
    PaymentOrchestrator,
    SignaturePolicy,
    SqliteDatabase,
};
use pg_common::{Money, Secret};
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

pub const TEST_SECRET: &str = "s3cr3t";

pub fn random_db_path() -> String {
    format!("sqlite://{}/paygate_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error connecting to test database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub fn jkopay_config() -> ProviderConfig {
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

pub fn registry() -> Arc<GatewayRegistry> {
    Arc::new(GatewayRegistry::build(vec![jkopay_config()]).expect("Error building registry"))
}

pub fn orchestrator(db: SqliteDatabase, policy: SignaturePolicy) -> PaymentOrchestrator<SqliteDatabase> {
    PaymentOrchestrator::new(db, registry(), policy)
}

/// Seeds a user, an active TWD payment link and a pending order against it, returning all three.
pub async fn seed_pending_order(db: &SqliteDatabase, amount: i64) -> (User, PaymentLink, Order) {
    let user = db
        .insert_user(NewUser { name: "Ada".to_string(), email: format!("ada{}@example.com", rand::random::<u32>()) })
        .await
        .expect("Error inserting user");
    let link = db
        .insert_payment_link(NewPaymentLink::new(user.id, Money::from_major(amount), "TWD", "jkopay".into()))
        .await
        .expect("Error inserting payment link");
    let order_id = new_order_reference(&link.id);
    let order = db
        .insert_order(NewOrder::new(order_id, user.id, link.amount, &link.currency).for_link(&link))
        .await
        .expect("Error inserting order");
    (user, link, order)
}

/// A correctly signed JkoPay callback for the given order.
pub fn signed_callback(order_no: &str, tx_id: &str, resp_code: &str, amount: &str) -> CallbackNotification {
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
