use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, OrderId, Payment, PaymentStatus},
    traits::PaymentStoreError,
};

/// The result of trying to record a settlement attempt. The unique index on (order_id, provider_tx_id) is the
/// de-duplication key for gateway re-deliveries.
pub enum InsertPaymentResult {
    Inserted(Payment),
    AlreadyExists,
}

pub async fn insert_payment(
    payment: NewPayment,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<InsertPaymentResult, PaymentStoreError> {
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, amount, status, method, provider_tx_id, currency, resp_code, resp_msg,
                verified, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.amount)
    .bind(status)
    .bind(payment.method)
    .bind(payment.provider_tx_id)
    .bind(payment.currency)
    .bind(payment.resp_code)
    .bind(payment.resp_msg)
    .bind(payment.verified)
    .bind(Utc::now())
    .fetch_one(conn)
    .await;
    match inserted {
        Ok(payment) => Ok(InsertPaymentResult::Inserted(payment)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertPaymentResult::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_payment_by_provider_tx(
    order_id: &OrderId,
    provider_tx_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, PaymentStoreError> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 AND provider_tx_id = $2")
        .bind(order_id.as_str())
        .bind(provider_tx_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn fetch_all_payments(conn: &mut SqliteConnection) -> Result<Vec<Payment>, PaymentStoreError> {
    let payments = sqlx::query_as("SELECT * FROM payments ORDER BY id").fetch_all(conn).await?;
    Ok(payments)
}
