//! # ecowear-store
//!
//! Persistence for the EcoWear storefront, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection`, runs versioned migrations on open, and provides
//! typed CRUD helpers for every domain model. The two read-modify-write
//! mutations against a review (like-toggle and reply-append) execute as
//! single transactions, so concurrent requests against the same review
//! cannot lose updates.

pub mod database;
pub mod migrations;
pub mod models;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
pub use orders::ImpactTotals;
