//! Repository traits and supporting query types.
//!
//! Each resource has its own trait; they all share one error type through
//! [`Repository`]. Storage backends (e.g. `hichoux-store-sqlite`) implement
//! every trait, and higher layers (`hichoux-api`, the managers in this crate)
//! depend on these abstractions, not on a concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  catalog::{Category, NewCategory, NewProduct, Product, ProductUpdate},
  customer::{Customer, CustomerUpsert},
  order::{NewOrder, Order, OrderHistoryEntry, OrderItem, OrderQuery, StatusPatch},
  shipment::{
    NewShipment, NewShippingLabel, Shipment, ShipmentUpdate, ShippingLabel, ShippingLabelItem,
  },
  team::{NewTeamMember, Setting, TeamMember},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`CatalogRepository::list_products`]. Only active products
/// are ever returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
  /// Restrict to featured products.
  #[serde(default)]
  pub featured: bool,
  /// Category slug.
  pub category: Option<String>,
  pub limit:    Option<usize>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// The base every repository trait extends, carrying the backend's error.
///
/// All methods return `Send` futures so the traits can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Repository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

pub trait CatalogRepository: Repository {
  /// Active products, newest first.
  fn list_products<'a>(
    &'a self,
    query: &'a ProductQuery,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + 'a;

  fn product(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  /// Active product with this slug.
  fn product_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + 'a;

  fn add_product(
    &self,
    input: NewProduct,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  /// Returns `None` if the product does not exist.
  fn update_product(
    &self,
    id: Uuid,
    update: ProductUpdate,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  /// Active categories by sort order.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  fn add_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;
}

pub trait OrderRepository: Repository {
  /// Write the order, its items and its creation history entry as one unit.
  /// The order number and `created_at` are assigned here.
  fn create_order(
    &self,
    input: NewOrder,
  ) -> impl Future<Output = Result<(Order, Vec<OrderItem>), Self::Error>> + Send + '_;

  fn order(&self, id: Uuid)
  -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  /// Exact match on the stored order number.
  fn order_by_number<'a>(
    &'a self,
    number: &'a str,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + 'a;

  /// Orders placed with this phone, newest first.
  fn orders_by_phone<'a>(
    &'a self,
    phone: &'a str,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + 'a;

  /// Newest first.
  fn list_orders<'a>(
    &'a self,
    query: &'a OrderQuery,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + 'a;

  fn order_items(
    &self,
    order_id: Uuid,
  ) -> impl Future<Output = Result<Vec<OrderItem>, Self::Error>> + Send + '_;

  /// Oldest first.
  fn order_history(
    &self,
    order_id: Uuid,
  ) -> impl Future<Output = Result<Vec<OrderHistoryEntry>, Self::Error>> + Send + '_;

  /// Write the new status, its timestamp stamp and a history entry as one
  /// unit. Returns `None` if the order does not exist. Callers validate the
  /// transition beforehand.
  fn apply_status(
    &self,
    order_id: Uuid,
    patch: StatusPatch,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;
}

pub trait CustomerRepository: Repository {
  /// Insert or overwrite the customer with this phone.
  fn upsert_customer(
    &self,
    input: CustomerUpsert,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  fn customer_by_phone<'a>(
    &'a self,
    phone: &'a str,
  ) -> impl Future<Output = Result<Option<Customer>, Self::Error>> + Send + 'a;

  /// Most recently updated first.
  fn list_customers(
    &self,
  ) -> impl Future<Output = Result<Vec<Customer>, Self::Error>> + Send + '_;
}

pub trait ShipmentRepository: Repository {
  fn create_shipment(
    &self,
    input: NewShipment,
  ) -> impl Future<Output = Result<Shipment, Self::Error>> + Send + '_;

  /// Returns `None` if the shipment does not exist.
  fn update_shipment(
    &self,
    id: Uuid,
    update: ShipmentUpdate,
  ) -> impl Future<Output = Result<Option<Shipment>, Self::Error>> + Send + '_;

  /// Oldest first.
  fn shipments_for_order(
    &self,
    order_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Shipment>, Self::Error>> + Send + '_;

  /// Write the label and one item per order id as one unit. Fails, writing
  /// nothing, if any order id is unknown.
  fn create_label(
    &self,
    input: NewShippingLabel,
    order_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<(ShippingLabel, Vec<ShippingLabelItem>), Self::Error>>
  + Send
  + '_;

  /// Newest first.
  fn list_labels(
    &self,
  ) -> impl Future<Output = Result<Vec<ShippingLabel>, Self::Error>> + Send + '_;

  fn label_items(
    &self,
    label_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ShippingLabelItem>, Self::Error>> + Send + '_;
}

pub trait TeamRepository: Repository {
  fn add_team_member(
    &self,
    input: NewTeamMember,
  ) -> impl Future<Output = Result<TeamMember, Self::Error>> + Send + '_;

  /// Ordered by name.
  fn list_team(
    &self,
  ) -> impl Future<Output = Result<Vec<TeamMember>, Self::Error>> + Send + '_;
}

pub trait SettingsRepository: Repository {
  /// Ordered by key.
  fn list_settings(
    &self,
  ) -> impl Future<Output = Result<Vec<Setting>, Self::Error>> + Send + '_;

  fn setting<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Setting>, Self::Error>> + Send + 'a;

  fn put_setting(
    &self,
    key: String,
    value: serde_json::Value,
  ) -> impl Future<Output = Result<Setting, Self::Error>> + Send + '_;
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
  Products,
  Categories,
  Orders,
  OrderItems,
  OrderHistory,
  Customers,
  Shipments,
  ShippingLabels,
  ShippingLabelItems,
  TeamMembers,
  Settings,
}

/// Event kind a subscription listens for. Events themselves are never `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeKind {
  #[serde(rename = "*")]
  #[strum(to_string = "*")]
  All,
  Insert,
  Update,
  Delete,
}

impl ChangeKind {
  pub fn matches(self, event: Self) -> bool { self == Self::All || self == event }
}

/// One committed row change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub resource: Resource,
  pub kind:     ChangeKind,
  /// Primary key of the changed row.
  pub id:       String,
  pub at:       DateTime<Utc>,
}

/// Realtime notification of committed changes.
pub trait ChangeFeed: Repository {
  /// Handle returned by [`ChangeFeed::subscribe`].
  type Subscription: Send + 'static;

  /// Call `callback` for every event on `resource` matching `kind`, until the
  /// subscription is passed to [`ChangeFeed::unsubscribe`].
  fn subscribe<F>(&self, resource: Resource, kind: ChangeKind, callback: F) -> Self::Subscription
  where
    F: Fn(ChangeEvent) + Send + Sync + 'static;

  fn unsubscribe(&self, subscription: Self::Subscription);
}

/// Everything a full storefront backend provides.
pub trait StoreBackend:
  CatalogRepository
  + OrderRepository
  + CustomerRepository
  + ShipmentRepository
  + TeamRepository
  + SettingsRepository
  + ChangeFeed
{
}

impl<T> StoreBackend for T where
  T: CatalogRepository
    + OrderRepository
    + CustomerRepository
    + ShipmentRepository
    + TeamRepository
    + SettingsRepository
    + ChangeFeed
{
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wildcard_kind_matches_everything() {
    assert!(ChangeKind::All.matches(ChangeKind::Delete));
    assert!(ChangeKind::Insert.matches(ChangeKind::Insert));
    assert!(!ChangeKind::Update.matches(ChangeKind::Insert));
    assert_eq!("*".parse::<ChangeKind>().unwrap(), ChangeKind::All);
    assert_eq!(Resource::ShippingLabels.to_string(), "shipping_labels");
  }
}
