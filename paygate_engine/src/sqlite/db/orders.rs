use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{LinkId, NewOrder, Order, OrderId, OrderStatus},
    traits::PaymentStoreError,
};

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentStoreError> {
    let now = Utc::now();
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (id, user_id, amount, currency, status, payment_link_id, method, created_at,
                updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.amount)
    .bind(order.currency)
    .bind(OrderStatus::Pending)
    .bind(order.payment_link_id)
    .bind(order.method)
    .bind(now)
    // `fetch_all` drains the statement to SQLITE_DONE, so the autocommit transaction is committed before this
    // returns and the row is visible to other pool connections.
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, PaymentStoreError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_for_link(
    link_id: &LinkId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentStoreError> {
    let order = sqlx::query_as(
        r#"
            SELECT * FROM orders WHERE payment_link_id = $1 ORDER BY created_at DESC LIMIT 1;
        "#,
    )
    .bind(link_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_all_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, PaymentStoreError> {
    let orders = sqlx::query_as("SELECT * FROM orders ORDER BY created_at").fetch_all(conn).await?;
    Ok(orders)
}

/// Atomically claims the Pending -> terminal transition for an order. The `status = 'Pending'` guard is the
/// claim: concurrent deliveries race here, and exactly one wins. Returns `None` when the order was not pending
/// (or does not exist).
pub async fn claim_pending_order(
    id: &OrderId,
    status: OrderStatus,
    provider_tx_id: &str,
    completed_at: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentStoreError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = $2, provider_tx_id = $3, completed_at = $4, updated_at = $5
            WHERE id = $1 AND status = $6
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(status)
    .bind(provider_tx_id)
    .bind(completed_at)
    .bind(Utc::now())
    .bind(OrderStatus::Pending)
    .fetch_optional(conn)
    .await?;
    if let Some(o) = &order {
        debug!("📝️ Order {} transitioned to {}", o.id, o.status);
    }
    Ok(order)
}
