//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings, money as decimal
//! strings, timestamps as RFC 3339 UTC with microsecond precision.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use hichoux_core::{
  catalog::{Category, CategoryRef, Product},
  customer::Customer,
  order::{Order, OrderHistoryEntry, OrderItem, OrderSource, OrderStatus, PaymentMethod},
  shipment::{Shipment, ShipmentStatus, ShippingLabel, ShippingLabelItem},
  team::{Setting, TeamMember},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_money(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_money(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_order_status(s: &str) -> Result<OrderStatus> { Ok(OrderStatus::parse(s)?) }

pub fn decode_shipment_status(s: &str) -> Result<ShipmentStatus> {
  Ok(ShipmentStatus::parse(s)?)
}

pub fn encode_payment_method(m: PaymentMethod) -> &'static str {
  match m {
    PaymentMethod::Cod => "cod",
  }
}

fn decode_payment_method(s: &str) -> Result<PaymentMethod> {
  match s {
    "cod" => Ok(PaymentMethod::Cod),
    other => Err(Error::InvalidValue(format!("unknown payment method: {other:?}"))),
  }
}

pub fn encode_source(s: OrderSource) -> &'static str {
  match s {
    OrderSource::Website => "website",
    OrderSource::Admin => "admin",
  }
}

fn decode_source(s: &str) -> Result<OrderSource> {
  match s {
    "website" => Ok(OrderSource::Website),
    "admin" => Ok(OrderSource::Admin),
    other => Err(Error::InvalidValue(format!("unknown order source: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawProduct::from_row`]; expects `products p` joined
/// with `categories c`.
pub const PRODUCT_COLUMNS: &str = "p.id, p.sku, p.name, p.slug, p.description, p.price,
  p.compare_price, p.stock, p.is_featured, p.is_active, p.images, p.created_at,
  c.id, c.name, c.slug";

pub struct RawProduct {
  pub id:            String,
  pub sku:           String,
  pub name:          String,
  pub slug:          String,
  pub description:   String,
  pub price:         String,
  pub compare_price: Option<String>,
  pub stock:         u32,
  pub is_featured:   bool,
  pub is_active:     bool,
  pub images:        String,
  pub created_at:    String,
  // categories join
  pub category_id:   Option<String>,
  pub category_name: Option<String>,
  pub category_slug: Option<String>,
}

impl RawProduct {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      sku:           row.get(1)?,
      name:          row.get(2)?,
      slug:          row.get(3)?,
      description:   row.get(4)?,
      price:         row.get(5)?,
      compare_price: row.get(6)?,
      stock:         row.get(7)?,
      is_featured:   row.get(8)?,
      is_active:     row.get(9)?,
      images:        row.get(10)?,
      created_at:    row.get(11)?,
      category_id:   row.get(12)?,
      category_name: row.get(13)?,
      category_slug: row.get(14)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    let category = match (self.category_id, self.category_name, self.category_slug) {
      (Some(id), Some(name), Some(slug)) => Some(CategoryRef { id: decode_uuid(&id)?, name, slug }),
      _ => None,
    };
    Ok(Product {
      id: decode_uuid(&self.id)?,
      sku: self.sku,
      name: self.name,
      slug: self.slug,
      description: self.description,
      price: decode_money(&self.price)?,
      compare_price: self.compare_price.as_deref().map(decode_money).transpose()?,
      stock: self.stock,
      category,
      is_featured: self.is_featured,
      is_active: self.is_active,
      images: serde_json::from_str(&self.images)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const CATEGORY_COLUMNS: &str = "id, name, slug, sort_order, is_active";

pub struct RawCategory {
  pub id:         String,
  pub name:       String,
  pub slug:       String,
  pub sort_order: i32,
  pub is_active:  bool,
}

impl RawCategory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      slug:       row.get(2)?,
      sort_order: row.get(3)?,
      is_active:  row.get(4)?,
    })
  }

  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      slug:       self.slug,
      sort_order: self.sort_order,
      is_active:  self.is_active,
    })
  }
}

pub const ORDER_COLUMNS: &str = "id, order_number, customer_id, customer_name, customer_phone,
  customer_email, shipping_address, shipping_city, notes, subtotal, shipping_cost, total,
  status, payment_method, source, created_at, confirmed_at, confirmed_by, shipped_at,
  delivered_at, cancelled_at, cancelled_reason";

pub struct RawOrder {
  pub id:               String,
  pub order_number:     String,
  pub customer_id:      Option<String>,
  pub customer_name:    String,
  pub customer_phone:   String,
  pub customer_email:   Option<String>,
  pub shipping_address: String,
  pub shipping_city:    String,
  pub notes:            String,
  pub subtotal:         String,
  pub shipping_cost:    String,
  pub total:            String,
  pub status:           String,
  pub payment_method:   String,
  pub source:           String,
  pub created_at:       String,
  pub confirmed_at:     Option<String>,
  pub confirmed_by:     Option<String>,
  pub shipped_at:       Option<String>,
  pub delivered_at:     Option<String>,
  pub cancelled_at:     Option<String>,
  pub cancelled_reason: Option<String>,
}

impl RawOrder {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      order_number:     row.get(1)?,
      customer_id:      row.get(2)?,
      customer_name:    row.get(3)?,
      customer_phone:   row.get(4)?,
      customer_email:   row.get(5)?,
      shipping_address: row.get(6)?,
      shipping_city:    row.get(7)?,
      notes:            row.get(8)?,
      subtotal:         row.get(9)?,
      shipping_cost:    row.get(10)?,
      total:            row.get(11)?,
      status:           row.get(12)?,
      payment_method:   row.get(13)?,
      source:           row.get(14)?,
      created_at:       row.get(15)?,
      confirmed_at:     row.get(16)?,
      confirmed_by:     row.get(17)?,
      shipped_at:       row.get(18)?,
      delivered_at:     row.get(19)?,
      cancelled_at:     row.get(20)?,
      cancelled_reason: row.get(21)?,
    })
  }

  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      id:               decode_uuid(&self.id)?,
      order_number:     self.order_number,
      customer_id:      decode_opt_uuid(self.customer_id)?,
      customer_name:    self.customer_name,
      customer_phone:   self.customer_phone,
      customer_email:   self.customer_email,
      shipping_address: self.shipping_address,
      shipping_city:    self.shipping_city,
      notes:            self.notes,
      subtotal:         decode_money(&self.subtotal)?,
      shipping_cost:    decode_money(&self.shipping_cost)?,
      total:            decode_money(&self.total)?,
      status:           decode_order_status(&self.status)?,
      payment_method:   decode_payment_method(&self.payment_method)?,
      source:           decode_source(&self.source)?,
      created_at:       decode_dt(&self.created_at)?,
      confirmed_at:     decode_opt_dt(self.confirmed_at)?,
      confirmed_by:     self.confirmed_by,
      shipped_at:       decode_opt_dt(self.shipped_at)?,
      delivered_at:     decode_opt_dt(self.delivered_at)?,
      cancelled_at:     decode_opt_dt(self.cancelled_at)?,
      cancelled_reason: self.cancelled_reason,
    })
  }
}

pub const ITEM_COLUMNS: &str =
  "id, order_id, product_id, product_sku, product_name, unit_price, quantity, total_price";

pub struct RawOrderItem {
  pub id:           String,
  pub order_id:     String,
  pub product_id:   Option<String>,
  pub product_sku:  String,
  pub product_name: String,
  pub unit_price:   String,
  pub quantity:     u32,
  pub total_price:  String,
}

impl RawOrderItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      order_id:     row.get(1)?,
      product_id:   row.get(2)?,
      product_sku:  row.get(3)?,
      product_name: row.get(4)?,
      unit_price:   row.get(5)?,
      quantity:     row.get(6)?,
      total_price:  row.get(7)?,
    })
  }

  pub fn into_item(self) -> Result<OrderItem> {
    Ok(OrderItem {
      id:           decode_uuid(&self.id)?,
      order_id:     decode_uuid(&self.order_id)?,
      product_id:   decode_opt_uuid(self.product_id)?,
      product_sku:  self.product_sku,
      product_name: self.product_name,
      unit_price:   decode_money(&self.unit_price)?,
      quantity:     self.quantity,
      total_price:  decode_money(&self.total_price)?,
    })
  }
}

pub const HISTORY_COLUMNS: &str = "id, order_id, status, note, changed_by_name, created_at";

pub struct RawHistoryEntry {
  pub id:              String,
  pub order_id:        String,
  pub status:          String,
  pub note:            String,
  pub changed_by_name: String,
  pub created_at:      String,
}

impl RawHistoryEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      order_id:        row.get(1)?,
      status:          row.get(2)?,
      note:            row.get(3)?,
      changed_by_name: row.get(4)?,
      created_at:      row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<OrderHistoryEntry> {
    Ok(OrderHistoryEntry {
      id:              decode_uuid(&self.id)?,
      order_id:        decode_uuid(&self.order_id)?,
      status:          decode_order_status(&self.status)?,
      note:            self.note,
      changed_by_name: self.changed_by_name,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub const CUSTOMER_COLUMNS: &str = "id, phone, name, email, address, city, created_at, updated_at";

pub struct RawCustomer {
  pub id:         String,
  pub phone:      String,
  pub name:       String,
  pub email:      Option<String>,
  pub address:    String,
  pub city:       String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawCustomer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      phone:      row.get(1)?,
      name:       row.get(2)?,
      email:      row.get(3)?,
      address:    row.get(4)?,
      city:       row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_customer(self) -> Result<Customer> {
    Ok(Customer {
      id:         decode_uuid(&self.id)?,
      phone:      self.phone,
      name:       self.name,
      email:      self.email,
      address:    self.address,
      city:       self.city,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const SHIPMENT_COLUMNS: &str =
  "id, order_id, carrier, tracking_number, status, created_at, updated_at";

pub struct RawShipment {
  pub id:              String,
  pub order_id:        String,
  pub carrier:         String,
  pub tracking_number: Option<String>,
  pub status:          String,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawShipment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      order_id:        row.get(1)?,
      carrier:         row.get(2)?,
      tracking_number: row.get(3)?,
      status:          row.get(4)?,
      created_at:      row.get(5)?,
      updated_at:      row.get(6)?,
    })
  }

  pub fn into_shipment(self) -> Result<Shipment> {
    Ok(Shipment {
      id:              decode_uuid(&self.id)?,
      order_id:        decode_uuid(&self.order_id)?,
      carrier:         self.carrier,
      tracking_number: self.tracking_number,
      status:          decode_shipment_status(&self.status)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

pub const LABEL_COLUMNS: &str = "id, label_number, carrier, note, created_at";

pub struct RawLabel {
  pub id:           String,
  pub label_number: String,
  pub carrier:      String,
  pub note:         String,
  pub created_at:   String,
}

impl RawLabel {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      label_number: row.get(1)?,
      carrier:      row.get(2)?,
      note:         row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_label(self) -> Result<ShippingLabel> {
    Ok(ShippingLabel {
      id:           decode_uuid(&self.id)?,
      label_number: self.label_number,
      carrier:      self.carrier,
      note:         self.note,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// `(id, label_id, order_id)` of a `shipping_label_items` row.
pub fn decode_label_item(
  (id, label_id, order_id): (String, String, String),
) -> Result<ShippingLabelItem> {
  Ok(ShippingLabelItem {
    id:       decode_uuid(&id)?,
    label_id: decode_uuid(&label_id)?,
    order_id: decode_uuid(&order_id)?,
  })
}

pub const TEAM_COLUMNS: &str = "id, name, email, role, is_active, created_at";

pub struct RawTeamMember {
  pub id:         String,
  pub name:       String,
  pub email:      String,
  pub role:       String,
  pub is_active:  bool,
  pub created_at: String,
}

impl RawTeamMember {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      email:      row.get(2)?,
      role:       row.get(3)?,
      is_active:  row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_member(self) -> Result<TeamMember> {
    Ok(TeamMember {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      email:      self.email,
      role:       self.role,
      is_active:  self.is_active,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// `(key, value, updated_at)` of a `settings` row.
pub fn decode_setting((key, value, updated_at): (String, String, String)) -> Result<Setting> {
  Ok(Setting {
    key,
    value: serde_json::from_str(&value)?,
    updated_at: decode_dt(&updated_at)?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_sortable() {
    let a = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap().with_timezone(&Utc);
    let b = DateTime::parse_from_rfc3339("2024-05-01T10:00:00.5Z").unwrap().with_timezone(&Utc);
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea, "2024-05-01T10:00:00.000000Z");
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn money_survives_a_round_trip() {
    let price = Decimal::new(14950, 2);
    assert_eq!(encode_money(price), "149.5");
    assert_eq!(decode_money("149.5").unwrap(), price);
    assert!(decode_money("abc").is_err());
  }
}
