//! The SQLite storage backend.
//!
//! `SqliteDatabase` implements every trait in [`crate::traits`]; the low-level queries live in per-table modules
//! under [`db`].

pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;
