//! JSON REST API for the Hichoux storefront and its back office.
//!
//! Exposes an axum [`Router`] backed by any [`StoreBackend`]. Runs on demo
//! data when no backend is configured: the catalog falls back to the demo
//! products, lookups return nothing and writes answer 503.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`   | `/products` | `?featured&category&limit` |
//! | `GET`   | `/products/{slug}` | 404 if missing |
//! | `GET`   | `/categories` | Active, by sort order |
//! | `POST`  | `/orders` | Body: `{lines, customer}`; 201 + submission |
//! | `GET`   | `/orders` | `?status&limit` |
//! | `GET`   | `/orders/{id}` | With items, shipments and history |
//! | `POST`  | `/orders/{id}/status` | Body: `{status, note, actor}` |
//! | `GET`   | `/track` | `?q=<order number or phone>` |
//! | `POST`  | `/shipments` | Body: [`NewShipment`](hichoux_core::shipment::NewShipment) |
//! | `PATCH` | `/shipments/{id}` | Partial update |
//! | `GET`   | `/shipping-labels` | Newest first |
//! | `POST`  | `/shipping-labels` | Body: `{label_number, carrier, note, order_ids}` |
//! | `GET`   | `/customers` | |
//! | `GET`   | `/settings` | |
//! | `PUT`   | `/settings/{key}` | Body: any JSON value |
//! | `GET`   | `/team` | |
//! | `GET`   | `/stats` | Dashboard counters |
//! | `GET`   | `/config` | Public store configuration |

pub mod admin;
pub mod catalog;
pub mod error;
pub mod orders;
pub mod shipping;
pub mod sync;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use hichoux_core::{
  Backend, OrderManager, ShipmentTracker, config::StoreConfig, store::StoreBackend,
};
use hichoux_sheets::MirrorClient;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `storefront.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// SQLite database; the server runs on demo data when unset.
  #[serde(default)]
  pub store_path: Option<PathBuf>,
  /// Endpoint of the order sheet mirror.
  #[serde(default)]
  pub mirror_url: Option<String>,
  #[serde(default)]
  pub store:      StoreConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: None,
      mirror_url: None,
      store:      StoreConfig::default(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub backend:  Backend<S>,
  pub orders:   OrderManager<S>,
  pub shipping: ShipmentTracker<S>,
  pub config:   Arc<ServerConfig>,
  /// Present only when sheet sync is enabled and a mirror URL is set.
  pub mirror:   Option<MirrorClient>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      backend:  self.backend.clone(),
      orders:   self.orders.clone(),
      shipping: self.shipping.clone(),
      config:   self.config.clone(),
      mirror:   self.mirror.clone(),
    }
  }
}

impl<S: StoreBackend> AppState<S> {
  pub fn new(backend: Backend<S>, config: ServerConfig) -> Self {
    let store_config = Arc::new(config.store.clone());
    let mirror = match (&config.mirror_url, config.store.features.google_sheets_sync) {
      (Some(url), true) => Some(MirrorClient::new(url.clone())),
      (None, true) => {
        tracing::warn!("sheet sync is enabled but no mirror_url is configured");
        None
      }
      _ => None,
    };

    Self {
      orders: OrderManager::new(backend.clone(), store_config),
      shipping: ShipmentTracker::new(backend.clone()),
      backend,
      config: Arc::new(config),
      mirror,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API [`Router`] for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: StoreBackend + 'static,
{
  Router::new()
    // Catalog
    .route("/products", get(catalog::list::<S>))
    .route("/products/{slug}", get(catalog::get_one::<S>))
    .route("/categories", get(catalog::categories::<S>))
    // Orders
    .route("/orders", get(orders::list::<S>).post(orders::create::<S>))
    .route("/orders/{id}", get(orders::get_one::<S>))
    .route("/orders/{id}/status", post(orders::update_status::<S>))
    .route("/track", get(orders::track::<S>))
    // Shipping
    .route("/shipments", post(shipping::create::<S>))
    .route("/shipments/{id}", patch(shipping::update::<S>))
    .route("/shipping-labels", get(shipping::labels::<S>).post(shipping::create_label::<S>))
    // Back office
    .route("/customers", get(admin::customers::<S>))
    .route("/settings", get(admin::settings::<S>))
    .route("/settings/{key}", put(admin::put_setting::<S>))
    .route("/team", get(admin::team::<S>))
    .route("/stats", get(admin::stats::<S>))
    .route("/config", get(admin::store_config::<S>))
    .with_state(state)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
