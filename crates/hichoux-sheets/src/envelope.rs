//! The `{action, ...}` request envelope and its `{success, ...}` replies.
//!
//! Every request is one JSON object naming an action:
//!
//! ```json
//! {"action": "addOrder", "order": {"orderRef": "HCX00000001", "name": "..."}}
//! {"action": "addOrders", "orders": [...]}
//! {"action": "updateStatus", "orderRef": "HCX00000001", "status": "Shipped", "tracking": "OZ1"}
//! {"action": "getOrders", "status": "New"}
//! ```
//!
//! Failures are reported in the reply body, never as a transport error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  record::MirrorOrder,
  sheet::{ALREADY_EXISTS, AddOutcome, BatchError, OrderSheet},
};

const ACTIONS: [&str; 4] = ["addOrder", "addOrders", "updateStatus", "getOrders"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
  AddOrder {
    order: MirrorOrder,
  },
  AddOrders {
    orders: Vec<MirrorOrder>,
  },
  #[serde(rename_all = "camelCase")]
  UpdateStatus {
    #[serde(default)]
    order_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status:    Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tracking:  Option<String>,
  },
  GetOrders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
  },
}

impl Action {
  /// Decode a request body. Unknown action names and a non-array `orders`
  /// get their own errors.
  pub fn parse(body: &[u8]) -> Result<Self> {
    let value: serde_json::Value =
      serde_json::from_slice(body).map_err(|e| Error::BadRequest(e.to_string()))?;

    let name = value.get("action").and_then(|a| a.as_str()).unwrap_or_default();
    if !ACTIONS.contains(&name) {
      return Err(Error::UnknownAction);
    }
    let batch = name == "addOrders";

    serde_json::from_value(value).map_err(|e| {
      if batch { Error::InvalidOrders } else { Error::BadRequest(e.to_string()) }
    })
  }

  /// Run the action against `sheet`.
  pub fn apply(self, sheet: &mut OrderSheet) -> Result<Reply> {
    match self {
      Self::AddOrder { order } => {
        let order_ref = order.order_ref.clone();
        Ok(match sheet.add_order(order)? {
          AddOutcome::Added { row } => Reply {
            message: Some("Order added successfully".into()),
            order_ref: Some(order_ref),
            row: Some(row),
            ..Reply::ok()
          },
          AddOutcome::Skipped => Reply {
            order_ref: Some(order_ref),
            ..Reply::failure(ALREADY_EXISTS)
          },
        })
      }
      Self::AddOrders { orders } => {
        let report = sheet.add_orders(orders)?;
        Ok(Reply {
          total: Some(report.total),
          added: Some(report.added),
          skipped: Some(report.skipped),
          failed: Some(report.failed),
          errors: Some(report.errors),
          ..Reply::ok()
        })
      }
      Self::UpdateStatus { order_ref, status, tracking } => {
        sheet.update_status(&order_ref, status.as_deref(), tracking.as_deref())?;
        Ok(Reply {
          message: Some("Order updated successfully".into()),
          order_ref: Some(order_ref),
          ..Reply::ok()
        })
      }
      Self::GetOrders { status } => {
        let orders: Vec<MirrorOrder> =
          sheet.get_orders(status.as_deref()).into_iter().cloned().collect();
        Ok(Reply { count: Some(orders.len()), orders: Some(orders), ..Reply::ok() })
      }
    }
  }
}

/// Decode `body`, apply it to `sheet` and fold any error into the reply.
pub fn handle(sheet: &mut OrderSheet, body: &[u8]) -> Reply {
  let result = Action::parse(body).and_then(|action| action.apply(sheet));
  result.unwrap_or_else(|e| {
    tracing::warn!(error = %e, "mirror request failed");
    Reply::failure(e.to_string())
  })
}

// ─── Replies ──────────────────────────────────────────────────────────────────

/// A reply body. Only the fields relevant to the action are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
  pub success:   bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order_ref: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub row:       Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub orders:    Option<Vec<MirrorOrder>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub count:     Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total:     Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub added:     Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub skipped:   Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub failed:    Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub errors:    Option<Vec<BatchError>>,
}

impl Reply {
  pub fn ok() -> Self { Self { success: true, ..Default::default() } }

  pub fn failure(error: impl Into<String>) -> Self {
    Self { success: false, error: Some(error.into()), ..Default::default() }
  }
}

/// The `GET /` health body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
  pub status:    String,
  pub message:   String,
  pub timestamp: DateTime<Utc>,
}

impl Health {
  pub fn now() -> Self {
    Self {
      status:    "ok".into(),
      message:   "Hichoux Store API is running".into(),
      timestamp: Utc::now(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_each_action() {
    let action = Action::parse(br#"{"action":"addOrder","order":{"orderRef":"HCX1"}}"#).unwrap();
    assert!(matches!(action, Action::AddOrder { order } if order.order_ref == "HCX1"));

    let action =
      Action::parse(br#"{"action":"updateStatus","orderRef":"HCX1","status":"Shipped"}"#)
        .unwrap();
    assert_eq!(
      action,
      Action::UpdateStatus {
        order_ref: "HCX1".into(),
        status:    Some("Shipped".into()),
        tracking:  None,
      }
    );

    let action = Action::parse(br#"{"action":"getOrders"}"#).unwrap();
    assert_eq!(action, Action::GetOrders { status: None });
  }

  #[test]
  fn unknown_action_is_reported() {
    let mut sheet = OrderSheet::new();
    let reply = handle(&mut sheet, br#"{"action":"dropTable"}"#);
    assert!(!reply.success);
    assert_eq!(reply.error.as_deref(), Some("Unknown action"));

    let reply = handle(&mut sheet, br#"{"order":{}}"#);
    assert_eq!(reply.error.as_deref(), Some("Unknown action"));
  }

  #[test]
  fn non_array_orders_is_reported() {
    let mut sheet = OrderSheet::new();
    let reply = handle(&mut sheet, br#"{"action":"addOrders","orders":"HCX1"}"#);
    assert!(!reply.success);
    assert_eq!(reply.error.as_deref(), Some("Invalid orders array"));
  }

  #[test]
  fn unparsable_body_is_a_failure_reply() {
    let mut sheet = OrderSheet::new();
    let reply = handle(&mut sheet, b"not json");
    assert!(!reply.success);
    assert!(reply.error.is_some());
  }

  #[test]
  fn duplicate_add_replies_already_exists() {
    let mut sheet = OrderSheet::new();
    let body = br#"{"action":"addOrder","order":{"orderRef":"HCX1"}}"#;

    let first = handle(&mut sheet, body);
    assert!(first.success);
    assert_eq!(first.row, Some(2));

    let second = handle(&mut sheet, body);
    assert!(!second.success);
    assert_eq!(second.error.as_deref(), Some("Order already exists"));
    assert_eq!(second.order_ref.as_deref(), Some("HCX1"));
  }

  #[test]
  fn falsy_cells_are_coerced_to_defaults() {
    let mut sheet = OrderSheet::new();
    let reply = handle(
      &mut sheet,
      br#"{"action":"addOrder","order":{"orderRef":"HCX1","quantity":0,"status":""}}"#,
    );
    assert!(reply.success);
    let reply =
      handle(&mut sheet, br#"{"action":"addOrder","order":{"orderRef":"HCX2","codAmount":null}}"#);
    assert!(reply.success, "{:?}", reply.error);

    let reply = handle(&mut sheet, br#"{"action":"getOrders","status":"New"}"#);
    let orders = reply.orders.unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.quantity == 1));
  }

  #[test]
  fn serialized_action_carries_its_tag() {
    let body = serde_json::to_value(Action::GetOrders { status: Some("New".into()) }).unwrap();
    assert_eq!(body, serde_json::json!({"action": "getOrders", "status": "New"}));
  }
}
