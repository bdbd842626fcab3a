//! Shipments and shipping labels.
//!
//! A shipment ties an order to a carrier and, once dispatched, a tracking
//! number. A shipping label groups several orders handed to a carrier
//! together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, order::Order};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShipmentStatus {
  #[default]
  Pending,
  InTransit,
  Delivered,
  Returned,
}

impl ShipmentStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
  pub id:              Uuid,
  pub order_id:        Uuid,
  /// Carrier id as listed in the store configuration.
  pub carrier:         String,
  pub tracking_number: Option<String>,
  pub status:          ShipmentStatus,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShipment {
  pub order_id:        Uuid,
  pub carrier:         String,
  #[serde(default)]
  pub tracking_number: Option<String>,
  #[serde(default)]
  pub status:          ShipmentStatus,
}

/// Partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentUpdate {
  pub carrier:         Option<String>,
  pub tracking_number: Option<String>,
  pub status:          Option<ShipmentStatus>,
}

impl ShipmentUpdate {
  pub fn is_empty(&self) -> bool {
    self.carrier.is_none() && self.tracking_number.is_none() && self.status.is_none()
  }
}

// ─── Labels ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLabel {
  pub id:           Uuid,
  pub label_number: String,
  pub carrier:      String,
  pub note:         String,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLabelItem {
  pub id:       Uuid,
  pub label_id: Uuid,
  pub order_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShippingLabel {
  pub label_number: String,
  pub carrier:      String,
  #[serde(default)]
  pub note:         String,
}

/// A label with its items and the orders they point to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDetails {
  pub label:  ShippingLabel,
  pub items:  Vec<ShippingLabelItem>,
  pub orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shipment_status_uses_snake_case() {
    assert_eq!(ShipmentStatus::InTransit.as_str(), "in_transit");
    assert_eq!(ShipmentStatus::parse("in_transit").unwrap(), ShipmentStatus::InTransit);
    assert_eq!(
      serde_json::to_string(&ShipmentStatus::InTransit).unwrap(),
      "\"in_transit\""
    );
    assert!(ShipmentStatus::parse("lost").is_err());
  }

  #[test]
  fn update_without_fields_is_empty() {
    assert!(ShipmentUpdate::default().is_empty());
    let update = ShipmentUpdate { tracking_number: Some("OZ123".into()), ..Default::default() };
    assert!(!update.is_empty());
  }
}
