//! The order sheet: one row per order reference, below a header row.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  record::{MirrorOrder, SheetRow},
};

/// Error text reported when a write hits an existing reference.
pub const ALREADY_EXISTS: &str = "Order already exists";

/// What happened to one `add_order` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
  /// Appended at this 1-based sheet row; the header is row 1.
  Added { row: usize },
  /// A row with that reference was already present and was left untouched.
  Skipped,
}

/// One rejected entry of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
  pub order_ref: String,
  pub error:     String,
}

/// Tallies of an `add_orders` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
  pub total:   usize,
  pub added:   usize,
  pub skipped: usize,
  pub failed:  usize,
  /// Failures only; skips of existing references are not listed.
  pub errors:  Vec<BatchError>,
}

/// The sheet, optionally backed by a JSON file that is rewritten after every
/// write.
#[derive(Debug, Default)]
pub struct OrderSheet {
  rows: Vec<SheetRow>,
  path: Option<PathBuf>,
}

impl OrderSheet {
  /// An empty, memory-only sheet.
  pub fn new() -> Self { Self::default() }

  /// Open the sheet persisted at `path`, or start an empty one there when the
  /// file does not exist yet.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let rows = match std::fs::read(&path) {
      Ok(bytes) => serde_json::from_slice::<Vec<SheetRow>>(&bytes)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
      Err(e) => return Err(e.into()),
    };
    let mut sheet = Self { rows, path: Some(path) };
    sheet.apply_formats();
    tracing::debug!(rows = sheet.rows.len(), "order sheet loaded");
    Ok(sheet)
  }

  pub fn rows(&self) -> &[SheetRow] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// The row holding `order_ref`, if any.
  pub fn find(&self, order_ref: &str) -> Option<&SheetRow> {
    self.rows.iter().find(|r| r.order.order_ref == order_ref)
  }

  // ─── Writes ─────────────────────────────────────────────────────────────────

  /// Append `order` unless its reference is already on the sheet.
  pub fn add_order(&mut self, order: MirrorOrder) -> Result<AddOutcome> {
    let outcome = self.insert(order)?;
    if matches!(outcome, AddOutcome::Added { .. }) {
      self.save()?;
    }
    Ok(outcome)
  }

  /// Append every order in turn; one bad entry never stops the batch.
  pub fn add_orders(&mut self, orders: Vec<MirrorOrder>) -> Result<BatchReport> {
    let mut report = BatchReport { total: orders.len(), ..Default::default() };

    for order in orders {
      let order_ref = order.order_ref.clone();
      match self.insert(order) {
        Ok(AddOutcome::Added { .. }) => report.added += 1,
        Ok(AddOutcome::Skipped) => report.skipped += 1,
        Err(e) => {
          report.failed += 1;
          report.errors.push(BatchError { order_ref, error: e.to_string() });
        }
      }
    }

    if report.added > 0 {
      self.save()?;
    }
    Ok(report)
  }

  /// Set the status (reformatting its cell) and/or the tracking number of
  /// the row holding `order_ref`.
  pub fn update_status(
    &mut self,
    order_ref: &str,
    status: Option<&str>,
    tracking: Option<&str>,
  ) -> Result<()> {
    let row = self
      .rows
      .iter_mut()
      .find(|r| r.order.order_ref == order_ref)
      .ok_or_else(|| Error::OrderNotFound(order_ref.to_owned()))?;

    if let Some(status) = status.filter(|s| !s.is_empty()) {
      row.order.status = status.to_owned();
      row.format_status();
    }
    if let Some(tracking) = tracking.filter(|t| !t.is_empty()) {
      row.order.tracking = tracking.to_owned();
    }
    self.save()
  }

  fn insert(&mut self, mut order: MirrorOrder) -> Result<AddOutcome> {
    if order.order_ref.trim().is_empty() {
      return Err(Error::MissingReference);
    }
    if self.find(&order.order_ref).is_some() {
      tracing::debug!(order_ref = %order.order_ref, "order already on sheet");
      return Ok(AddOutcome::Skipped);
    }

    order.normalize();
    order.created_at = Some(Utc::now());
    self.rows.push(SheetRow::new(order));
    Ok(AddOutcome::Added { row: self.rows.len() + 1 })
  }

  fn save(&self) -> Result<()> {
    let Some(path) = &self.path else { return Ok(()) };
    let json = serde_json::to_vec_pretty(&self.rows)?;
    std::fs::write(path, json)?;
    Ok(())
  }

  // ─── Reads and back-office actions ──────────────────────────────────────────

  /// Every row, or only those whose status equals `status`.
  pub fn get_orders(&self, status: Option<&str>) -> Vec<&MirrorOrder> {
    self
      .rows
      .iter()
      .map(|r| &r.order)
      .filter(|o| status.is_none_or(|s| o.status == s))
      .collect()
  }

  /// Reapply the status colors to every row; returns the number of rows.
  pub fn refresh_formatting(&mut self) -> usize {
    self.apply_formats();
    self.rows.len()
  }

  fn apply_formats(&mut self) {
    for row in &mut self.rows {
      row.format_status();
    }
  }

  /// Row count per status value.
  pub fn count_by_status(&self) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in &self.rows {
      *counts.entry(row.order.status.clone()).or_insert(0) += 1;
    }
    counts
  }

  /// Sum of COD amounts over delivered rows.
  pub fn delivered_revenue(&self) -> Decimal {
    self
      .rows
      .iter()
      .filter(|r| r.order.status == "Delivered")
      .map(|r| r.order.cod_amount)
      .sum()
  }
}
