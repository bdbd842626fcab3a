//! Store configuration: the read-only lookup tables the rest of the crate
//! consults by key.
//!
//! Every table can be overridden from a config file; missing sections fall
//! back to the defaults below. Lookups never fail: an unknown status gets a
//! neutral style, an unknown carrier gets no tracking link.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Sections ────────────────────────────────────────────────────────────────

/// Identity strings shown to customers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreIdentity {
  pub name:     String,
  pub phone:    String,
  pub email:    String,
  pub address:  String,
  /// International format, digits only.
  pub whatsapp: String,
}

impl Default for StoreIdentity {
  fn default() -> Self {
    Self {
      name:     "Hichoux Store".into(),
      phone:    "0600000000".into(),
      email:    "contact@hichouxstore.ma".into(),
      address:  "Casablanca, Maroc".into(),
      whatsapp: "212600000000".into(),
    }
  }
}

/// Shipping cost rules applied to cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingRules {
  pub default_shipping_cost:   Decimal,
  /// Subtotals at or above this ship for free.
  pub free_shipping_threshold: Decimal,
  pub fulfillment_fee:         Decimal,
}

impl Default for ShippingRules {
  fn default() -> Self {
    Self {
      default_shipping_cost:   Decimal::from(30),
      free_shipping_threshold: Decimal::from(500),
      fulfillment_fee:         Decimal::from(5),
    }
  }
}

impl ShippingRules {
  /// Shipping charged for a given subtotal.
  pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
    if subtotal >= self.free_shipping_threshold {
      Decimal::ZERO
    } else {
      self.default_shipping_cost
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Currency {
  /// Display label appended to amounts, e.g. `"DH"`.
  pub label: String,
  /// ISO 4217 code.
  pub code:  String,
}

impl Default for Currency {
  fn default() -> Self { Self { label: "DH".into(), code: "MAD".into() } }
}

/// Label and badge color for an order status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStyle {
  pub label: String,
  pub color: String,
}

/// A delivery carrier and the base URL its tracking numbers are appended to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
  pub id:           String,
  pub name:         String,
  pub tracking_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub label:       String,
  pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
  pub google_sheets_sync:     bool,
  pub digylog_integration:    bool,
  pub whatsapp_notifications: bool,
  pub email_notifications:    bool,
  pub sms_notifications:      bool,
  pub realtime_updates:       bool,
}

impl Default for FeatureFlags {
  fn default() -> Self {
    Self {
      google_sheets_sync:     true,
      digylog_integration:    true,
      whatsapp_notifications: true,
      email_notifications:    false,
      sms_notifications:      false,
      realtime_updates:       true,
    }
  }
}

// ─── StoreConfig ─────────────────────────────────────────────────────────────

/// All configuration tables for one store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  pub store:    StoreIdentity,
  pub shipping: ShippingRules,
  pub currency: Currency,
  pub cities:   Vec<String>,
  /// Keyed by the lowercase status name (`new`, `confirmed`, ...).
  pub statuses: BTreeMap<String, StatusStyle>,
  pub carriers: Vec<Carrier>,
  pub roles:    BTreeMap<String, Role>,
  pub features: FeatureFlags,
}

fn style(label: &str, color: &str) -> StatusStyle {
  StatusStyle { label: label.into(), color: color.into() }
}

fn role(label: &str, permissions: &[&str]) -> Role {
  Role {
    label:       label.into(),
    permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
  }
}

impl Default for StoreConfig {
  fn default() -> Self {
    let cities = [
      "Casablanca", "Rabat", "Marrakech", "Fès", "Tanger", "Agadir", "Meknès",
      "Oujda", "Kénitra", "Tétouan", "Safi", "El Jadida", "Nador",
      "Beni Mellal", "Mohammedia", "Khouribga", "Settat", "Taza", "Berrechid",
      "Khemisset", "Autre",
    ];

    let statuses = BTreeMap::from([
      ("new".to_owned(), style("Nouvelle", "yellow")),
      ("confirmed".to_owned(), style("Confirmée", "blue")),
      ("shipped".to_owned(), style("Expédiée", "purple")),
      ("delivered".to_owned(), style("Livrée", "green")),
      ("cancelled".to_owned(), style("Annulée", "red")),
      ("returned".to_owned(), style("Retournée", "orange")),
    ]);

    let carriers = vec![
      Carrier {
        id:           "digylog".into(),
        name:         "Digylog".into(),
        tracking_url: "https://www.digylog.com/suivi-de-colis/?tracking=".into(),
      },
      Carrier {
        id:           "ozone".into(),
        name:         "Ozone Express".into(),
        tracking_url: "https://client.ozoneexpress.ma/tracking/".into(),
      },
      Carrier {
        id:           "sendit".into(),
        name:         "Sendit".into(),
        tracking_url: "https://sendit.ma/tracking/".into(),
      },
    ];

    let roles = BTreeMap::from([
      ("admin".to_owned(), role("Admin", &["all"])),
      (
        "manager".to_owned(),
        role("Manager", &["orders", "products", "shipping", "team"]),
      ),
      ("confirmator".to_owned(), role("Confirmateur", &["orders", "confirmation"])),
      ("viewer".to_owned(), role("Viewer", &["view"])),
    ]);

    Self {
      store: StoreIdentity::default(),
      shipping: ShippingRules::default(),
      currency: Currency::default(),
      cities: cities.iter().map(|c| (*c).to_owned()).collect(),
      statuses,
      carriers,
      roles,
      features: FeatureFlags::default(),
    }
  }
}

impl StoreConfig {
  /// Label and color for `status`; unknown keys fall back to the raw status
  /// name in gray.
  pub fn status_style(&self, status: &str) -> StatusStyle {
    self
      .statuses
      .get(status)
      .cloned()
      .unwrap_or_else(|| style(status, "gray"))
  }

  pub fn carrier(&self, id: &str) -> Option<&Carrier> {
    self.carriers.iter().find(|c| c.id == id)
  }

  /// The carrier's base tracking URL with the raw tracking number appended.
  pub fn tracking_url(&self, carrier_id: &str, tracking_number: &str) -> Option<String> {
    if tracking_number.is_empty() {
      return None;
    }
    self
      .carrier(carrier_id)
      .map(|c| format!("{}{}", c.tracking_url, tracking_number))
  }

  pub fn format_price(&self, amount: Decimal) -> String {
    format!("{} {}", amount.normalize(), self.currency.label)
  }

  /// A `wa.me` link for a Moroccan phone number, optionally with a prefilled
  /// message.
  pub fn whatsapp_link(&self, phone: &str, message: Option<&str>) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let intl = match digits.strip_prefix('0') {
      Some(rest) => format!("212{rest}"),
      None => digits,
    };
    match message.filter(|m| !m.is_empty()) {
      Some(m) => format!("https://wa.me/{intl}?text={}", urlencoding::encode(m)),
      None => format!("https://wa.me/{intl}"),
    }
  }

  /// Whether `role` carries `permission`. `all` grants everything.
  pub fn role_permits(&self, role: &str, permission: &str) -> bool {
    self.roles.get(role).is_some_and(|r| {
      r.permissions.iter().any(|p| p == "all" || p == permission)
    })
  }

  pub fn is_known_city(&self, city: &str) -> bool {
    self.cities.iter().any(|c| c == city)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shipping_is_free_at_threshold() {
    let rules = ShippingRules::default();
    assert_eq!(rules.shipping_for(Decimal::from(499)), Decimal::from(30));
    assert_eq!(rules.shipping_for(Decimal::from(500)), Decimal::ZERO);
  }

  #[test]
  fn unknown_status_falls_back_to_gray() {
    let cfg = StoreConfig::default();
    assert_eq!(cfg.status_style("shipped").label, "Expédiée");
    let fallback = cfg.status_style("lost");
    assert_eq!(fallback.label, "lost");
    assert_eq!(fallback.color, "gray");
  }

  #[test]
  fn tracking_url_concatenates_raw_number() {
    let cfg = StoreConfig::default();
    assert_eq!(
      cfg.tracking_url("ozone", "OZ123").as_deref(),
      Some("https://client.ozoneexpress.ma/tracking/OZ123")
    );
    assert!(cfg.tracking_url("fedex", "OZ123").is_none());
    assert!(cfg.tracking_url("ozone", "").is_none());
  }

  #[test]
  fn whatsapp_link_rewrites_leading_zero() {
    let cfg = StoreConfig::default();
    assert_eq!(cfg.whatsapp_link("06 00-00 00 00", None), "https://wa.me/212600000000");
    assert_eq!(
      cfg.whatsapp_link("212600000000", Some("Bonjour à vous")),
      "https://wa.me/212600000000?text=Bonjour%20%C3%A0%20vous"
    );
  }

  #[test]
  fn role_permissions() {
    let cfg = StoreConfig::default();
    assert!(cfg.role_permits("admin", "shipping"));
    assert!(cfg.role_permits("confirmator", "confirmation"));
    assert!(!cfg.role_permits("viewer", "orders"));
    assert!(!cfg.role_permits("ghost", "view"));
  }

  #[test]
  fn format_price_uses_currency_label() {
    let cfg = StoreConfig::default();
    assert_eq!(cfg.format_price(Decimal::new(15000, 2)), "150 DH");
  }
}
