//! Core types and trait definitions for the Hichoux storefront.
//!
//! This crate is free of HTTP and database dependencies. All other crates
//! depend on it.

// Native `async fn` in traits; suppress the advisory lint about `Send`
// bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod customer;
pub mod error;
pub mod lifecycle;
pub mod order;
pub mod session;
pub mod shipment;
pub mod shipping;
pub mod store;
pub mod team;

pub use backend::Backend;
pub use error::{Error, Result, ResultExt};
pub use lifecycle::OrderManager;
pub use shipping::ShipmentTracker;
