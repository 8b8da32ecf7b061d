use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{LinkId, LinkStatus, NewPaymentLink, PaymentLink},
    traits::PaymentStoreError,
};

pub async fn insert_payment_link(
    link: NewPaymentLink,
    conn: &mut SqliteConnection,
) -> Result<PaymentLink, PaymentStoreError> {
    let now = Utc::now();
    let link = sqlx::query_as(
        r#"
            INSERT INTO payment_links (id, user_id, amount, currency, description, method, status, usage_cap,
                usage_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $9)
            RETURNING *;
        "#,
    )
    .bind(link.id)
    .bind(link.user_id)
    .bind(link.amount)
    .bind(link.currency)
    .bind(link.description)
    .bind(link.method)
    .bind(LinkStatus::Active)
    .bind(link.usage_cap)
    .bind(now)
    // `fetch_all` drains the statement to SQLITE_DONE, so the autocommit transaction is committed before this
    // returns and the row is visible to other pool connections.
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(link)
}

pub async fn fetch_payment_link(
    id: &LinkId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentLink>, PaymentStoreError> {
    let link =
        sqlx::query_as("SELECT * FROM payment_links WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(link)
}

pub async fn fetch_all_payment_links(conn: &mut SqliteConnection) -> Result<Vec<PaymentLink>, PaymentStoreError> {
    let links = sqlx::query_as("SELECT * FROM payment_links ORDER BY created_at").fetch_all(conn).await?;
    Ok(links)
}

/// Records a successful settlement against the link: bumps the usage counter and closes the link once it cannot
/// accept further payments. A capped link stays `Active` until the cap is reached; an uncapped link is single-use
/// and completes on its first settlement.
pub async fn advance_link_on_success(
    id: &LinkId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentLink>, PaymentStoreError> {
    let link = sqlx::query_as::<_, PaymentLink>(
        r#"
            UPDATE payment_links SET usage_count = usage_count + 1, updated_at = $2
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;
    let Some(link) = link else {
        return Ok(None);
    };
    let close = match link.usage_cap {
        Some(cap) => link.usage_count >= cap,
        None => true,
    };
    if !close {
        return Ok(Some(link));
    }
    debug!("🔗️ Payment link {} has been used up and is now complete", link.id);
    set_link_status(id, LinkStatus::Completed, conn).await
}

pub async fn set_link_status(
    id: &LinkId,
    status: LinkStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentLink>, PaymentStoreError> {
    let link = sqlx::query_as(
        r#"
            UPDATE payment_links SET status = $2, updated_at = $3 WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(status)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(link)
}
