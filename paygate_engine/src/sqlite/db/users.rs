use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User},
    traits::PaymentStoreError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, PaymentStoreError> {
    let user = sqlx::query_as(
        r#"
            INSERT INTO users (name, email, created_at) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(user.name)
    .bind(user.email)
    .bind(Utc::now())
    // `fetch_all` drains the statement to SQLITE_DONE, so the autocommit transaction is committed before this
    // returns and the row is visible to other pool connections.
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(user)
}

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, PaymentStoreError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>, PaymentStoreError> {
    let users = sqlx::query_as("SELECT * FROM users ORDER BY id").fetch_all(conn).await?;
    Ok(users)
}
