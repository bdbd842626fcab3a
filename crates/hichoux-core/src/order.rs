//! Orders, their items and their append-only status history.
//!
//! An order is created once, in [`OrderStatus::New`], and afterwards only
//! moves through [`OrderStatus::can_transition_to`]. Customer and product
//! fields are snapshots taken at submission time; later catalog or customer
//! edits never rewrite a placed order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, cart::CartLine, shipment::Shipment};

/// Order numbers start with this prefix.
pub const ORDER_NUMBER_PREFIX: &str = "HCX";

/// Actor recorded on history entries written by the system itself.
pub const SYSTEM_ACTOR: &str = "System";

/// Note recorded on the creation history entry.
pub const CREATED_NOTE: &str = "Commande créée";

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
  New,
  Confirmed,
  Shipped,
  Delivered,
  Cancelled,
  Returned,
}

/// The forward line shown on the tracking page.
pub const STATUS_STEPS: [OrderStatus; 4] = [
  OrderStatus::New,
  OrderStatus::Confirmed,
  OrderStatus::Shipped,
  OrderStatus::Delivered,
];

impl OrderStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  /// Parse a status name as stored and sent over the wire.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Delivered | Self::Cancelled | Self::Returned)
  }

  /// Only delivered orders count toward revenue.
  pub fn counts_as_revenue(self) -> bool { self == Self::Delivered }

  /// Position on [`STATUS_STEPS`], or `None` for the side exits.
  pub fn step(self) -> Option<usize> { STATUS_STEPS.iter().position(|s| *s == self) }

  /// Allowed moves: forward along the step line, or a side exit to
  /// cancelled/returned, from any non-terminal status.
  pub fn can_transition_to(self, next: Self) -> bool {
    if self.is_terminal() || self == next {
      return false;
    }
    match next {
      Self::Cancelled | Self::Returned => true,
      _ => match (self.step(), next.step()) {
        (Some(from), Some(to)) => to > from,
        _ => false,
      },
    }
  }

  /// Statuses reachable from this one.
  pub fn next_statuses(self) -> Vec<Self> {
    Self::iter().filter(|s| self.can_transition_to(*s)).collect()
  }

  /// The capitalized name used by the order sheet, e.g. `"Shipped"`.
  pub fn sheet_label(self) -> &'static str {
    match self {
      Self::New => "New",
      Self::Confirmed => "Confirmed",
      Self::Shipped => "Shipped",
      Self::Delivered => "Delivered",
      Self::Cancelled => "Cancelled",
      Self::Returned => "Returned",
    }
  }
}

/// Where the tracking view places an order on the step line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackingProgress {
  /// Number of completed steps, counting the current one; 0 for side exits.
  pub completed: usize,
  pub total:     usize,
}

impl From<OrderStatus> for TrackingProgress {
  fn from(status: OrderStatus) -> Self {
    Self {
      completed: status.step().map_or(0, |i| i + 1),
      total:     STATUS_STEPS.len(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  /// Cash on delivery, the only method offered.
  #[default]
  Cod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSource {
  #[default]
  Website,
  Admin,
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id:               Uuid,
  pub order_number:     String,
  /// Weak, phone-keyed link to the customer record.
  pub customer_id:      Option<Uuid>,
  pub customer_name:    String,
  pub customer_phone:   String,
  pub customer_email:   Option<String>,
  pub shipping_address: String,
  pub shipping_city:    String,
  pub notes:            String,
  pub subtotal:         Decimal,
  pub shipping_cost:    Decimal,
  pub total:            Decimal,
  pub status:           OrderStatus,
  pub payment_method:   PaymentMethod,
  pub source:           OrderSource,
  pub created_at:       DateTime<Utc>,
  pub confirmed_at:     Option<DateTime<Utc>>,
  pub confirmed_by:     Option<String>,
  pub shipped_at:       Option<DateTime<Utc>>,
  pub delivered_at:     Option<DateTime<Utc>>,
  pub cancelled_at:     Option<DateTime<Utc>>,
  pub cancelled_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id:           Uuid,
  pub order_id:     Uuid,
  /// Weak reference; the product may since have been deactivated.
  pub product_id:   Option<Uuid>,
  pub product_sku:  String,
  pub product_name: String,
  pub unit_price:   Decimal,
  pub quantity:     u32,
  pub total_price:  Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
  pub id:              Uuid,
  pub order_id:        Uuid,
  pub status:          OrderStatus,
  pub note:            String,
  pub changed_by_name: String,
  pub created_at:      DateTime<Utc>,
}

/// An order with everything hanging off it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
  pub order:     Order,
  pub items:     Vec<OrderItem>,
  pub shipments: Vec<Shipment>,
  /// Oldest first. Empty when the query did not ask for history.
  #[serde(default)]
  pub history:   Vec<OrderHistoryEntry>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// The checkout form as submitted by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerForm {
  pub name:    String,
  pub phone:   String,
  #[serde(default)]
  pub email:   Option<String>,
  pub address: String,
  pub city:    String,
  #[serde(default)]
  pub notes:   String,
}

impl CustomerForm {
  /// Trimmed copy; blank required fields are rejected.
  pub fn validated(&self) -> Result<Self> {
    let form = Self {
      name:    self.name.trim().to_owned(),
      phone:   self.phone.trim().to_owned(),
      email:   self
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_owned),
      address: self.address.trim().to_owned(),
      city:    self.city.trim().to_owned(),
      notes:   self.notes.trim().to_owned(),
    };

    for (field, value) in [
      ("name", &form.name),
      ("phone", &form.phone),
      ("address", &form.address),
      ("city", &form.city),
    ] {
      if value.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
      }
    }
    Ok(form)
  }
}

/// One item snapshot to write with a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderItem {
  pub product_id:   Option<Uuid>,
  pub product_sku:  String,
  pub product_name: String,
  pub unit_price:   Decimal,
  pub quantity:     u32,
  pub total_price:  Decimal,
}

impl From<&CartLine> for NewOrderItem {
  fn from(line: &CartLine) -> Self {
    Self {
      product_id:   Some(line.product_id),
      product_sku:  line.sku.clone(),
      product_name: line.name.clone(),
      unit_price:   line.unit_price,
      quantity:     line.quantity,
      total_price:  line.line_total(),
    }
  }
}

/// Everything the repository needs to create an order, its items and its
/// first history entry. The order number is assigned by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
  pub customer_id:      Option<Uuid>,
  pub customer_name:    String,
  pub customer_phone:   String,
  pub customer_email:   Option<String>,
  pub shipping_address: String,
  pub shipping_city:    String,
  pub notes:            String,
  pub subtotal:         Decimal,
  pub shipping_cost:    Decimal,
  pub total:            Decimal,
  pub payment_method:   PaymentMethod,
  pub source:           OrderSource,
  pub items:            Vec<NewOrderItem>,
  pub created_note:     String,
  pub created_by:       String,
}

/// A validated status change, with the timestamp fields it stamps.
///
/// Built by [`StatusPatch::for_transition`]; the repository writes the status,
/// the stamp and the history entry as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPatch {
  pub status:           OrderStatus,
  pub at:               DateTime<Utc>,
  pub note:             String,
  pub actor:            String,
  pub confirmed_by:     Option<String>,
  pub cancelled_reason: Option<String>,
}

impl StatusPatch {
  pub fn for_transition(
    from: OrderStatus,
    to: OrderStatus,
    note: impl Into<String>,
    actor: impl Into<String>,
    at: DateTime<Utc>,
  ) -> Result<Self> {
    if !from.can_transition_to(to) {
      return Err(Error::InvalidTransition { from, to });
    }
    let note = note.into();
    let actor = actor.into();
    Ok(Self {
      status: to,
      at,
      confirmed_by: (to == OrderStatus::Confirmed).then(|| actor.clone()),
      cancelled_reason: (to == OrderStatus::Cancelled).then(|| note.clone()),
      note,
      actor,
    })
  }
}

/// Filters for listing orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
  pub status: Option<OrderStatus>,
  pub limit:  Option<usize>,
}

// ─── Order numbers ───────────────────────────────────────────────────────────

/// Whether a tracking query looks like an order number rather than a phone.
pub fn looks_like_order_number(query: &str) -> bool {
  query
    .get(..ORDER_NUMBER_PREFIX.len())
    .is_some_and(|p| p.eq_ignore_ascii_case(ORDER_NUMBER_PREFIX))
}

/// `HCX` followed by a zero-padded sequence number, e.g. `HCX00000001`.
pub fn sequential_order_number(seq: u64) -> String {
  format!("{ORDER_NUMBER_PREFIX}{seq:08}")
}

/// The order number handed out when no backend is connected: `HCX` and the
/// last eight digits of the Unix-millisecond clock.
pub fn demo_order_number(now: DateTime<Utc>) -> String {
  let millis = now.timestamp_millis().unsigned_abs().to_string();
  let tail = &millis[millis.len().saturating_sub(8)..];
  format!("{ORDER_NUMBER_PREFIX}{tail}")
}
