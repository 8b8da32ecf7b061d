//! Low-level SQLite database interactions.
//!
//! All interactions are maintained as simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open a transaction and pass
//! `&mut *tx` to compose several calls atomically.

use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod orders;
pub mod payment_links;
pub mod payments;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/paygate.db";

pub fn db_url() -> String {
    let result = env::var("PGW_DATABASE_URL").unwrap_or_else(|_| {
        info!("PGW_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
