//! Sheet rows and their formatting.

use chrono::{DateTime, Utc};
use hichoux_core::order::{Order, OrderItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Column titles, in sheet order.
pub const HEADERS: [&str; 13] = [
  "Order Reference",
  "Name",
  "Phone",
  "Address",
  "City",
  "COD Amount",
  "Product SKU",
  "Quantity",
  "Notes",
  "Tracking Number",
  "Status",
  "Errors",
  "Created At",
];

/// Status written when an incoming row carries none.
pub const DEFAULT_STATUS: &str = "New";

// ─── Mirror order ─────────────────────────────────────────────────────────────

/// One order as the mirror sees it. This is both the wire shape of the
/// envelope and the content of a sheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorOrder {
  #[serde(default)]
  pub order_ref:   String,
  #[serde(default)]
  pub name:        String,
  #[serde(default)]
  pub phone:       String,
  #[serde(default)]
  pub address:     String,
  #[serde(default)]
  pub city:        String,
  #[serde(default, deserialize_with = "nullable")]
  pub cod_amount:  Decimal,
  #[serde(default)]
  pub product_sku: String,
  /// Zero or `null` becomes 1 on insert.
  #[serde(default = "default_quantity", deserialize_with = "nullable")]
  pub quantity:    u32,
  #[serde(default)]
  pub notes:       String,
  #[serde(default)]
  pub tracking:    String,
  /// Blank or `null` becomes [`DEFAULT_STATUS`] on insert.
  #[serde(default = "default_status", deserialize_with = "nullable")]
  pub status:      String,
  #[serde(default)]
  pub errors:      String,
  /// Stamped by the sheet on insert; whatever the sender puts here is
  /// replaced.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at:  Option<DateTime<Utc>>,
}

fn default_quantity() -> u32 { 1 }

fn default_status() -> String { DEFAULT_STATUS.to_owned() }

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl MirrorOrder {
  /// An order with the given reference and every other column defaulted.
  pub fn new(order_ref: impl Into<String>) -> Self {
    Self {
      order_ref:   order_ref.into(),
      name:        String::new(),
      phone:       String::new(),
      address:     String::new(),
      city:        String::new(),
      cod_amount:  Decimal::ZERO,
      product_sku: String::new(),
      quantity:    default_quantity(),
      notes:       String::new(),
      tracking:    String::new(),
      status:      default_status(),
      errors:      String::new(),
      created_at:  None,
    }
  }

  /// Replace empty quantity and status cells with their defaults.
  pub fn normalize(&mut self) {
    if self.quantity == 0 {
      self.quantity = default_quantity();
    }
    if self.status.trim().is_empty() {
      self.status = default_status();
    }
  }

  /// Flatten a stored order into one sheet row. The COD amount is the order
  /// total; SKUs are joined and quantities summed across items.
  pub fn from_details(order: &Order, items: &[OrderItem]) -> Self {
    let product_sku = items
      .iter()
      .map(|i| i.product_sku.as_str())
      .collect::<Vec<_>>()
      .join(", ");

    Self {
      order_ref: order.order_number.clone(),
      name: order.customer_name.clone(),
      phone: order.customer_phone.clone(),
      address: order.shipping_address.clone(),
      city: order.shipping_city.clone(),
      cod_amount: order.total,
      product_sku,
      quantity: items.iter().fold(0, |n, i| n.saturating_add(i.quantity)),
      notes: order.notes.clone(),
      tracking: String::new(),
      status: order.status.sheet_label().to_owned(),
      errors: String::new(),
      created_at: Some(order.created_at),
    }
  }
}

// ─── Formatting ───────────────────────────────────────────────────────────────

/// Colors and weight of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellFormat {
  pub background: &'static str,
  pub text:       &'static str,
  pub bold:       bool,
}

impl CellFormat {
  /// The frozen header row.
  pub const HEADER: Self = Self { background: "#1a1a1a", text: "#ffffff", bold: true };

  /// The status cell format for `status`; unknown statuses are gray.
  pub fn for_status(status: &str) -> Self {
    let (background, text) = match status {
      "New" => ("#fef3c7", "#92400e"),
      "Confirmed" => ("#dbeafe", "#1e40af"),
      "Shipped" => ("#ede9fe", "#5b21b6"),
      "Delivered" => ("#d1fae5", "#065f46"),
      "Cancelled" => ("#fee2e2", "#991b1b"),
      "Returned" => ("#fed7aa", "#9a3412"),
      _ => ("#f3f4f6", "#374151"),
    };
    Self { background, text, bold: true }
  }
}

/// A stored row: the order plus the format of its status cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
  #[serde(flatten)]
  pub order:         MirrorOrder,
  #[serde(skip, default = "unformatted")]
  pub status_format: CellFormat,
}

fn unformatted() -> CellFormat {
  CellFormat { background: "#ffffff", text: "#000000", bold: false }
}

impl SheetRow {
  pub fn new(order: MirrorOrder) -> Self {
    let status_format = CellFormat::for_status(&order.status);
    Self { order, status_format }
  }

  pub fn format_status(&mut self) {
    self.status_format = CellFormat::for_status(&self.order.status);
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use hichoux_core::order::{OrderSource, OrderStatus, PaymentMethod};
  use rust_decimal::Decimal;
  use uuid::Uuid;

  use super::*;

  fn order() -> Order {
    Order {
      id:               Uuid::new_v4(),
      order_number:     "HCX00000007".into(),
      customer_id:      None,
      customer_name:    "Salma".into(),
      customer_phone:   "0612345678".into(),
      customer_email:   None,
      shipping_address: "12 rue Atlas".into(),
      shipping_city:    "Rabat".into(),
      notes:            "Sonner deux fois".into(),
      subtotal:         Decimal::from(300),
      shipping_cost:    Decimal::from(30),
      total:            Decimal::from(330),
      status:           OrderStatus::Confirmed,
      payment_method:   PaymentMethod::Cod,
      source:           OrderSource::Website,
      created_at:       Utc::now(),
      confirmed_at:     None,
      confirmed_by:     None,
      shipped_at:       None,
      delivered_at:     None,
      cancelled_at:     None,
      cancelled_reason: None,
    }
  }

  fn item(order_id: Uuid, sku: &str, quantity: u32) -> OrderItem {
    OrderItem {
      id: Uuid::new_v4(),
      order_id,
      product_id: None,
      product_sku: sku.into(),
      product_name: sku.into(),
      unit_price: Decimal::from(100),
      quantity,
      total_price: Decimal::from(100) * Decimal::from(quantity),
    }
  }

  #[test]
  fn from_details_flattens_items() {
    let order = order();
    let items = [item(order.id, "HCX-HB-001", 2), item(order.id, "HCX-SC-003", 1)];

    let row = MirrorOrder::from_details(&order, &items);
    assert_eq!(row.order_ref, "HCX00000007");
    assert_eq!(row.cod_amount, Decimal::from(330));
    assert_eq!(row.product_sku, "HCX-HB-001, HCX-SC-003");
    assert_eq!(row.quantity, 3);
    assert_eq!(row.status, "Confirmed");
    assert_eq!(row.address, "12 rue Atlas");
  }

  #[test]
  fn missing_columns_take_defaults() {
    let row: MirrorOrder = serde_json::from_str(r#"{"orderRef": "HCX1"}"#).unwrap();
    assert_eq!(row.quantity, 1);
    assert_eq!(row.status, "New");
    assert_eq!(row.cod_amount, Decimal::ZERO);
    assert!(row.created_at.is_none());
  }

  #[test]
  fn null_cells_take_defaults() {
    let mut row: MirrorOrder = serde_json::from_str(
      r#"{"orderRef": "HCX2", "codAmount": null, "quantity": null, "status": null}"#,
    )
    .unwrap();
    assert_eq!(row.cod_amount, Decimal::ZERO);
    row.normalize();
    assert_eq!(row.quantity, 1);
    assert_eq!(row.status, "New");
  }

  #[test]
  fn from_details_saturates_quantity() {
    let order = order();
    let items = [item(order.id, "A", u32::MAX), item(order.id, "B", 2)];
    assert_eq!(MirrorOrder::from_details(&order, &items).quantity, u32::MAX);
  }

  #[test]
  fn unknown_status_is_gray_and_bold() {
    let format = CellFormat::for_status("Lost");
    assert_eq!(format.background, "#f3f4f6");
    assert_eq!(format.text, "#374151");
    assert!(format.bold);
    assert_eq!(CellFormat::for_status("Delivered").background, "#d1fae5");
  }
}
