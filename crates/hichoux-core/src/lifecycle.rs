//! The order lifecycle manager: checkout submission, status changes, lookups
//! and tracking.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  backend::Backend,
  cart::{CartLine, CartTotals},
  config::StoreConfig,
  customer::CustomerUpsert,
  order::{
    CREATED_NOTE, CustomerForm, NewOrder, NewOrderItem, Order, OrderDetails, OrderHistoryEntry,
    OrderItem, OrderQuery, OrderSource, OrderStatus, PaymentMethod, SYSTEM_ACTOR, StatusPatch,
    TrackingProgress, demo_order_number, looks_like_order_number,
  },
  store::{CustomerRepository, OrderRepository, ShipmentRepository},
};

// ─── Results ─────────────────────────────────────────────────────────────────

/// The outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
  pub order_number: String,
  pub totals:       CartTotals,
  /// The stored order; `None` in demo mode.
  pub details:      Option<OrderDetails>,
}

impl Submission {
  pub fn is_demo(&self) -> bool { self.details.is_none() }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
  pub total_orders:  usize,
  /// Every status is present, zero when no order has it.
  pub by_status:     BTreeMap<OrderStatus, usize>,
  /// Sum of delivered order totals.
  pub revenue:       Decimal,
  pub today_orders:  usize,
  pub today_revenue: Decimal,
}

impl DashboardStats {
  /// Tally `orders`; "today" is the UTC calendar day `today`.
  pub fn from_orders(orders: &[Order], today: NaiveDate) -> Self {
    let mut stats = Self {
      by_status: OrderStatus::iter().map(|s| (s, 0)).collect(),
      ..Self::default()
    };

    for order in orders {
      stats.total_orders += 1;
      *stats.by_status.entry(order.status).or_default() += 1;

      let is_today = order.created_at.date_naive() == today;
      if is_today {
        stats.today_orders += 1;
      }
      if order.status.counts_as_revenue() {
        stats.revenue += order.total;
        if is_today {
          stats.today_revenue += order.total;
        }
      }
    }
    stats
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Order operations over an optional repository backend.
pub struct OrderManager<S> {
  backend: Backend<S>,
  config:  Arc<StoreConfig>,
}

impl<S> Clone for OrderManager<S> {
  fn clone(&self) -> Self {
    Self { backend: self.backend.clone(), config: Arc::clone(&self.config) }
  }
}

impl<S> OrderManager<S> {
  pub fn new(backend: Backend<S>, config: Arc<StoreConfig>) -> Self { Self { backend, config } }

  pub fn backend(&self) -> &Backend<S> { &self.backend }

  pub fn config(&self) -> &StoreConfig { &self.config }

  pub fn tracking_progress(&self, status: OrderStatus) -> TrackingProgress {
    TrackingProgress::from(status)
  }

  /// Tracking URL of the first shipment that has a tracking number.
  pub fn tracking_link(&self, details: &OrderDetails) -> Option<String> {
    details.shipments.iter().find_map(|s| {
      let number = s.tracking_number.as_deref()?;
      self.config.tracking_url(&s.carrier, number)
    })
  }
}

impl<S> OrderManager<S>
where
  S: OrderRepository + CustomerRepository + ShipmentRepository,
{
  /// Turn a cart snapshot and checkout form into a stored order.
  ///
  /// Nothing is written unless the lines and the form are valid.
  pub async fn submit(&self, lines: &[CartLine], form: &CustomerForm) -> Result<Submission> {
    if lines.is_empty() {
      return Err(Error::Validation("cart is empty".into()));
    }
    if let Some(line) = lines.iter().find(|l| l.quantity == 0) {
      return Err(Error::Validation(format!("{} has quantity 0", line.sku)));
    }
    let form = form.validated()?;
    let totals = CartTotals::checked(lines, &self.config.shipping)?;

    let store = match &self.backend {
      Backend::Connected(store) => store,
      Backend::Demo => {
        let order_number = demo_order_number(Utc::now());
        tracing::info!(%order_number, "demo mode: order not persisted");
        return Ok(Submission { order_number, totals, details: None });
      }
    };

    let customer_id = match store.upsert_customer(CustomerUpsert::from(&form)).await {
      Ok(customer) => Some(customer.id),
      Err(err) => {
        tracing::warn!(phone = %form.phone, error = %err, "customer upsert failed");
        None
      }
    };

    let input = NewOrder {
      customer_id,
      customer_name: form.name,
      customer_phone: form.phone,
      customer_email: form.email,
      shipping_address: form.address,
      shipping_city: form.city,
      notes: form.notes,
      subtotal: totals.subtotal,
      shipping_cost: totals.shipping,
      total: totals.total,
      payment_method: PaymentMethod::Cod,
      source: OrderSource::Website,
      items: lines.iter().map(NewOrderItem::from).collect(),
      created_note: CREATED_NOTE.into(),
      created_by: SYSTEM_ACTOR.into(),
    };

    let (order, items) = store.create_order(input).await.map_err(Error::persistence)?;
    tracing::info!(order_number = %order.order_number, total = %order.total, "order submitted");

    Ok(Submission {
      order_number: order.order_number.clone(),
      totals,
      details: Some(OrderDetails { order, items, shipments: Vec::new(), history: Vec::new() }),
    })
  }

  /// Move an order to `status`, stamping the matching timestamp and
  /// appending a history entry. An empty actor is recorded as the system.
  pub async fn update_status(
    &self,
    order_id: Uuid,
    status: OrderStatus,
    note: &str,
    actor: &str,
  ) -> Result<Order> {
    let store = self.backend.get()?;
    let current = store
      .order(order_id)
      .await
      .map_err(Error::persistence)?
      .ok_or_else(|| Error::NotFound(format!("order {order_id}")))?;

    let actor = match actor.trim() {
      "" => SYSTEM_ACTOR,
      a => a,
    };
    let patch = StatusPatch::for_transition(current.status, status, note.trim(), actor, Utc::now())?;

    let order = store
      .apply_status(order_id, patch)
      .await
      .map_err(Error::persistence)?
      .ok_or_else(|| Error::NotFound(format!("order {order_id}")))?;
    tracing::info!(
      order_number = %order.order_number,
      from = %current.status,
      to = %order.status,
      "order status changed"
    );
    Ok(order)
  }

  /// Order by number, any case, with items and shipments.
  pub async fn find_by_number(&self, number: &str) -> Result<Option<OrderDetails>> {
    let Some(store) = self.backend.store() else { return Ok(None) };
    let number = number.trim().to_uppercase();
    match store.order_by_number(&number).await.map_err(Error::persistence)? {
      Some(order) => self.details(store, order, false).await.map(Some),
      None => Ok(None),
    }
  }

  /// Every order for a phone, newest first, with items and shipments.
  pub async fn find_by_phone(&self, phone: &str) -> Result<Vec<OrderDetails>> {
    let Some(store) = self.backend.store() else { return Ok(Vec::new()) };
    let orders = store.orders_by_phone(phone.trim()).await.map_err(Error::persistence)?;
    let mut found = Vec::with_capacity(orders.len());
    for order in orders {
      found.push(self.details(store, order, false).await?);
    }
    Ok(found)
  }

  /// Resolve a tracking query: an order number, or a phone whose newest
  /// order is returned.
  pub async fn track(&self, query: &str) -> Result<Option<OrderDetails>> {
    let query = query.trim();
    if query.is_empty() {
      return Err(Error::Validation("tracking query is empty".into()));
    }
    if looks_like_order_number(query) {
      self.find_by_number(query).await
    } else {
      Ok(self.find_by_phone(query).await?.into_iter().next())
    }
  }

  /// One order with items, shipments and history.
  pub async fn order(&self, id: Uuid) -> Result<Option<OrderDetails>> {
    let Some(store) = self.backend.store() else { return Ok(None) };
    match store.order(id).await.map_err(Error::persistence)? {
      Some(order) => self.details(store, order, true).await.map(Some),
      None => Ok(None),
    }
  }

  pub async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
    let Some(store) = self.backend.store() else { return Ok(Vec::new()) };
    store.list_orders(query).await.map_err(Error::persistence)
  }

  pub async fn history(&self, order_id: Uuid) -> Result<Vec<OrderHistoryEntry>> {
    let Some(store) = self.backend.store() else { return Ok(Vec::new()) };
    store.order_history(order_id).await.map_err(Error::persistence)
  }

  pub async fn items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let Some(store) = self.backend.store() else { return Ok(Vec::new()) };
    store.order_items(order_id).await.map_err(Error::persistence)
  }

  pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
    self.dashboard_stats_at(Utc::now()).await
  }

  pub async fn dashboard_stats_at(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
    let orders = self.list_orders(&OrderQuery::default()).await?;
    Ok(DashboardStats::from_orders(&orders, now.date_naive()))
  }

  async fn details(&self, store: &S, order: Order, with_history: bool) -> Result<OrderDetails> {
    let items = store.order_items(order.id).await.map_err(Error::persistence)?;
    let shipments = store.shipments_for_order(order.id).await.map_err(Error::persistence)?;
    let history = if with_history {
      store.order_history(order.id).await.map_err(Error::persistence)?
    } else {
      Vec::new()
    };
    Ok(OrderDetails { order, items, shipments, history })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;
  use crate::{cart::Cart, cart::MemoryCartStorage, catalog::Catalog};

  fn order_at(status: OrderStatus, total: i64, created_at: DateTime<Utc>) -> Order {
    Order {
      id: Uuid::new_v4(),
      order_number: "HCX00000001".into(),
      customer_id: None,
      customer_name: "Amine".into(),
      customer_phone: "0612345678".into(),
      customer_email: None,
      shipping_address: "12 rue Atlas".into(),
      shipping_city: "Rabat".into(),
      notes: String::new(),
      subtotal: Decimal::from(total),
      shipping_cost: Decimal::ZERO,
      total: Decimal::from(total),
      status,
      payment_method: PaymentMethod::Cod,
      source: OrderSource::Website,
      created_at,
      confirmed_at: None,
      confirmed_by: None,
      shipped_at: None,
      delivered_at: None,
      cancelled_at: None,
      cancelled_reason: None,
    }
  }

  #[test]
  fn stats_count_only_delivered_revenue() {
    let today = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
    let yesterday = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let orders = vec![
      order_at(OrderStatus::Delivered, 300, today),
      order_at(OrderStatus::Delivered, 200, yesterday),
      order_at(OrderStatus::Shipped, 999, today),
      order_at(OrderStatus::Cancelled, 50, yesterday),
    ];

    let stats = DashboardStats::from_orders(&orders, today.date_naive());
    assert_eq!(stats.total_orders, 4);
    assert_eq!(stats.revenue, Decimal::from(500));
    assert_eq!(stats.today_orders, 2);
    assert_eq!(stats.today_revenue, Decimal::from(300));
    assert_eq!(stats.by_status[&OrderStatus::Returned], 0);
    assert_eq!(stats.by_status[&OrderStatus::Delivered], 2);
  }

  struct NoStore;

  impl crate::store::Repository for NoStore {
    type Error = std::io::Error;
  }

  fn demo_manager() -> OrderManager<NoStore> {
    OrderManager::new(Backend::Demo, Arc::new(StoreConfig::default()))
  }

  fn form() -> CustomerForm {
    CustomerForm {
      name: "Amine".into(),
      phone: "0612345678".into(),
      address: "12 rue Atlas".into(),
      city: "Rabat".into(),
      ..CustomerForm::default()
    }
  }

  #[test]
  fn tracking_link_uses_first_numbered_shipment() {
    use crate::shipment::{Shipment, ShipmentStatus};

    let now = Utc::now();
    let order = order_at(OrderStatus::Shipped, 100, now);
    let shipment = |carrier: &str, number: Option<&str>| Shipment {
      id: Uuid::new_v4(),
      order_id: order.id,
      carrier: carrier.into(),
      tracking_number: number.map(str::to_owned),
      status: ShipmentStatus::InTransit,
      created_at: now,
      updated_at: now,
    };
    let details = OrderDetails {
      shipments: vec![shipment("digylog", None), shipment("sendit", Some("SD42"))],
      order,
      items: Vec::new(),
      history: Vec::new(),
    };
    assert_eq!(
      demo_manager().tracking_link(&details).as_deref(),
      Some("https://sendit.ma/tracking/SD42")
    );
  }

  // The demo-mode paths never touch the repository, so a store that
  // implements none of the data traits is enough to exercise them.
  mod demo {
    use super::*;
    use crate::{
      customer::Customer,
      shipment::{
        NewShipment, NewShippingLabel, Shipment, ShipmentUpdate, ShippingLabel, ShippingLabelItem,
      },
    };

    type Res<T> = std::result::Result<T, std::io::Error>;

    fn unused<T>() -> Res<T> { Err(std::io::Error::other("unused")) }

    impl OrderRepository for NoStore {
      async fn create_order(&self, _: NewOrder) -> Res<(Order, Vec<OrderItem>)> { unused() }
      async fn order(&self, _: Uuid) -> Res<Option<Order>> { unused() }
      async fn order_by_number<'a>(&'a self, _: &'a str) -> Res<Option<Order>> { unused() }
      async fn orders_by_phone<'a>(&'a self, _: &'a str) -> Res<Vec<Order>> { unused() }
      async fn list_orders<'a>(&'a self, _: &'a OrderQuery) -> Res<Vec<Order>> { unused() }
      async fn order_items(&self, _: Uuid) -> Res<Vec<OrderItem>> { unused() }
      async fn order_history(&self, _: Uuid) -> Res<Vec<OrderHistoryEntry>> { unused() }
      async fn apply_status(&self, _: Uuid, _: StatusPatch) -> Res<Option<Order>> { unused() }
    }

    impl CustomerRepository for NoStore {
      async fn upsert_customer(&self, _: CustomerUpsert) -> Res<Customer> { unused() }
      async fn customer_by_phone<'a>(&'a self, _: &'a str) -> Res<Option<Customer>> { unused() }
      async fn list_customers(&self) -> Res<Vec<Customer>> { unused() }
    }

    impl ShipmentRepository for NoStore {
      async fn create_shipment(&self, _: NewShipment) -> Res<Shipment> { unused() }
      async fn update_shipment(&self, _: Uuid, _: ShipmentUpdate) -> Res<Option<Shipment>> {
        unused()
      }
      async fn shipments_for_order(&self, _: Uuid) -> Res<Vec<Shipment>> { unused() }
      async fn create_label(
        &self,
        _: NewShippingLabel,
        _: Vec<Uuid>,
      ) -> Res<(ShippingLabel, Vec<ShippingLabelItem>)> {
        unused()
      }
      async fn list_labels(&self) -> Res<Vec<ShippingLabel>> { unused() }
      async fn label_items(&self, _: Uuid) -> Res<Vec<ShippingLabelItem>> { unused() }
    }

    #[tokio::test]
    async fn demo_submission_issues_timestamp_number() {
      let mut cart = Cart::load(MemoryCartStorage::default()).unwrap();
      let catalog = Catalog::demo();
      cart.add(&catalog, catalog.products[0].id, 2).unwrap();

      let submission = demo_manager().submit(cart.lines(), &form()).await.unwrap();
      assert!(submission.is_demo());
      assert!(submission.order_number.starts_with("HCX"));
      assert_eq!(submission.order_number.len(), 11);
      assert_eq!(submission.totals.total, Decimal::from(330));
    }

    #[tokio::test]
    async fn empty_cart_and_blank_form_are_rejected_first() {
      let manager = demo_manager();
      assert!(matches!(manager.submit(&[], &form()).await, Err(Error::Validation(_))));

      let catalog = Catalog::demo();
      let mut cart = Cart::load(MemoryCartStorage::default()).unwrap();
      cart.add(&catalog, catalog.products[0].id, 1).unwrap();
      let blank = CustomerForm { city: String::new(), ..form() };
      assert!(matches!(manager.submit(cart.lines(), &blank).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn tampered_prices_are_rejected_not_charged() {
      let manager = demo_manager();
      let catalog = Catalog::demo();
      let mut cart = Cart::load(MemoryCartStorage::default()).unwrap();
      cart.add(&catalog, catalog.products[0].id, 1).unwrap();

      let mut negative = cart.lines().to_vec();
      negative[0].unit_price = Decimal::from(-500);
      assert!(matches!(manager.submit(&negative, &form()).await, Err(Error::Validation(_))));

      let mut huge = cart.lines().to_vec();
      huge[0].unit_price = Decimal::MAX;
      huge[0].quantity = 2;
      assert!(matches!(manager.submit(&huge, &form()).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn failed_dashboard_degrades_to_empty_stats() {
      use crate::ResultExt as _;

      let manager = OrderManager::new(Backend::connected(NoStore), Arc::new(StoreConfig::default()));
      let result = manager.dashboard_stats().await;
      assert!(matches!(result, Err(Error::Persistence(_))));

      let stats = manager.dashboard_stats().await.or_degraded("dashboard stats");
      assert_eq!(stats, DashboardStats::default());
    }

    #[tokio::test]
    async fn demo_lookups_are_empty_and_writes_fail() {
      let manager = demo_manager();
      assert!(manager.track("HCX00000001").await.unwrap().is_none());
      assert!(manager.track("0612345678").await.unwrap().is_none());
      assert!(matches!(manager.track("   ").await, Err(Error::Validation(_))));
      assert_eq!(manager.dashboard_stats().await.unwrap().total_orders, 0);

      let err = manager
        .update_status(Uuid::new_v4(), OrderStatus::Confirmed, "", "")
        .await
        .unwrap_err();
      assert!(err.is_not_connected());
    }
  }
}
