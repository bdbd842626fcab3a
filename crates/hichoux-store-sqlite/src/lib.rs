//! SQLite backend for the Hichoux storefront.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod catalog;
mod customers;
mod encode;
mod feed;
mod orders;
mod schema;
mod settings;
mod shipments;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use feed::Subscription;
pub use store::SqliteStore;
