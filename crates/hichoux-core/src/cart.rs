//! The client-side shopping cart and its durable storage.
//!
//! The cart holds at most one line per product id and every line has a
//! quantity of at least 1. Each mutation rewrites the complete line list to
//! storage, so a restart reloads exactly what the customer last saw.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::Mutex,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, catalog::Catalog, config::ShippingRules};

/// The fixed key the cart is persisted under.
pub const CART_STORAGE_KEY: &str = "hichoux_cart";

// ─── Lines and totals ────────────────────────────────────────────────────────

/// One product in the cart, with a snapshot of the product taken when it was
/// first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  /// Weak reference: the product may since have left the catalog.
  #[serde(rename = "id")]
  pub product_id: Uuid,
  pub sku:        String,
  pub name:       String,
  #[serde(rename = "price")]
  pub unit_price: Decimal,
  #[serde(rename = "qty")]
  pub quantity:   u32,
  #[serde(default)]
  pub image:      Option<String>,
}

impl CartLine {
  /// Price times quantity, saturating at [`Decimal::MAX`].
  pub fn line_total(&self) -> Decimal {
    self.unit_price.saturating_mul(Decimal::from(self.quantity))
  }

  /// Price times quantity, or `None` on overflow.
  pub fn checked_total(&self) -> Option<Decimal> {
    self.unit_price.checked_mul(Decimal::from(self.quantity))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
  pub subtotal: Decimal,
  pub shipping: Decimal,
  pub total:    Decimal,
}

impl CartTotals {
  /// Totals for any list of lines under `rules`, for display. Sums saturate
  /// instead of overflowing.
  pub fn compute(lines: &[CartLine], rules: &ShippingRules) -> Self {
    let subtotal = lines
      .iter()
      .map(CartLine::line_total)
      .fold(Decimal::ZERO, Decimal::saturating_add);
    let shipping = rules.shipping_for(subtotal);
    Self { subtotal, shipping, total: subtotal.saturating_add(shipping) }
  }

  /// Totals for lines about to be charged. Negative prices and amounts too
  /// large to represent are rejected.
  pub fn checked(lines: &[CartLine], rules: &ShippingRules) -> Result<Self> {
    let mut subtotal = Decimal::ZERO;
    for line in lines {
      if line.unit_price < Decimal::ZERO {
        return Err(Error::Validation(format!("{} has a negative price", line.sku)));
      }
      subtotal = line
        .checked_total()
        .and_then(|t| subtotal.checked_add(t))
        .ok_or_else(|| Error::Validation(format!("{} puts the total out of range", line.sku)))?;
    }
    let shipping = rules.shipping_for(subtotal);
    let total = subtotal
      .checked_add(shipping)
      .ok_or_else(|| Error::Validation("order total out of range".into()))?;
    Ok(Self { subtotal, shipping, total })
  }

  pub fn ships_free(&self) -> bool { self.shipping.is_zero() }
}

// ─── Storage ─────────────────────────────────────────────────────────────────

/// Durable client-side storage for the serialized cart.
pub trait CartStorage {
  /// The stored line list, or `None` if nothing was ever saved under `key`.
  fn load(&self, key: &str) -> Result<Option<Vec<CartLine>>>;

  /// Replace whatever is stored under `key` with `lines`.
  fn save(&self, key: &str, lines: &[CartLine]) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
  dir: PathBuf,
}

impl FileCartStorage {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  pub fn path_for(&self, key: &str) -> PathBuf { self.dir.join(format!("{key}.json")) }

  pub fn dir(&self) -> &Path { &self.dir }
}

impl CartStorage for FileCartStorage {
  fn load(&self, key: &str) -> Result<Option<Vec<CartLine>>> {
    let path = self.path_for(key);
    match std::fs::read_to_string(&path) {
      Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Error::Storage(format!("reading {}: {e}", path.display()))),
    }
  }

  fn save(&self, key: &str, lines: &[CartLine]) -> Result<()> {
    std::fs::create_dir_all(&self.dir)
      .map_err(|e| Error::Storage(format!("creating {}: {e}", self.dir.display())))?;
    let path = self.path_for(key);
    let raw = serde_json::to_string(lines)?;
    // Write-then-rename: readers never observe a partial file.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, raw)
      .map_err(|e| Error::Storage(format!("writing {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, &path)
      .map_err(|e| Error::Storage(format!("replacing {}: {e}", path.display())))?;
    Ok(())
  }
}

/// Process-local storage, for tests and embedded sessions.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
  entries: Mutex<HashMap<String, String>>,
}

impl CartStorage for MemoryCartStorage {
  fn load(&self, key: &str) -> Result<Option<Vec<CartLine>>> {
    let entries = self
      .entries
      .lock()
      .map_err(|_| Error::Storage("cart storage lock poisoned".into()))?;
    entries
      .get(key)
      .map(|raw| serde_json::from_str(raw).map_err(Error::from))
      .transpose()
  }

  fn save(&self, key: &str, lines: &[CartLine]) -> Result<()> {
    let raw = serde_json::to_string(lines)?;
    self
      .entries
      .lock()
      .map_err(|_| Error::Storage("cart storage lock poisoned".into()))?
      .insert(key.to_owned(), raw);
    Ok(())
  }
}

impl<T: CartStorage + ?Sized> CartStorage for &T {
  fn load(&self, key: &str) -> Result<Option<Vec<CartLine>>> { (**self).load(key) }

  fn save(&self, key: &str, lines: &[CartLine]) -> Result<()> { (**self).save(key, lines) }
}

// ─── Cart ────────────────────────────────────────────────────────────────────

/// The session's cart, bound to the storage it persists into.
#[derive(Debug)]
pub struct Cart<S: CartStorage> {
  lines:   Vec<CartLine>,
  storage: S,
  key:     String,
}

impl<S: CartStorage> Cart<S> {
  /// Restore the cart saved under [`CART_STORAGE_KEY`], or start empty.
  pub fn load(storage: S) -> Result<Self> { Self::load_with_key(storage, CART_STORAGE_KEY) }

  pub fn load_with_key(storage: S, key: impl Into<String>) -> Result<Self> {
    let key = key.into();
    let mut lines = storage.load(&key)?.unwrap_or_default();
    // Repair what a hand-edited file may have broken.
    lines.retain(|l| l.quantity > 0);
    let mut seen = std::collections::HashSet::new();
    lines.retain(|l| seen.insert(l.product_id));
    Ok(Self { lines, storage, key })
  }

  pub fn lines(&self) -> &[CartLine] { &self.lines }

  pub fn is_empty(&self) -> bool { self.lines.is_empty() }

  pub fn line(&self, product_id: Uuid) -> Option<&CartLine> {
    self.lines.iter().find(|l| l.product_id == product_id)
  }

  /// Total number of units, shown on the cart badge.
  pub fn item_count(&self) -> u32 {
    self.lines.iter().fold(0, |n, l| n.saturating_add(l.quantity))
  }

  /// Add `qty` units of a catalog product.
  ///
  /// Returns `false` without touching the cart when the product is not in
  /// `catalog` or `qty` is zero.
  pub fn add(&mut self, catalog: &Catalog, product_id: Uuid, qty: u32) -> Result<bool> {
    let Some(product) = catalog.find(product_id) else {
      return Ok(false);
    };
    if qty == 0 {
      return Ok(false);
    }

    match self.lines.iter_mut().find(|l| l.product_id == product_id) {
      Some(line) => line.quantity = line.quantity.saturating_add(qty),
      None => self.lines.push(CartLine {
        product_id,
        sku: product.sku.clone(),
        name: product.name.clone(),
        unit_price: product.price,
        quantity: qty,
        image: product.primary_image().map(str::to_owned),
      }),
    }

    self.persist()?;
    Ok(true)
  }

  /// Shift a line's quantity by `delta`, never below 1.
  pub fn update_quantity(&mut self, product_id: Uuid, delta: i64) -> Result<()> {
    let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) else {
      return Ok(());
    };
    let next = (i64::from(line.quantity) + delta).clamp(1, i64::from(u32::MAX));
    line.quantity = next as u32;
    self.persist()
  }

  pub fn remove(&mut self, product_id: Uuid) -> Result<()> {
    self.lines.retain(|l| l.product_id != product_id);
    self.persist()
  }

  pub fn totals(&self, rules: &ShippingRules) -> CartTotals {
    CartTotals::compute(&self.lines, rules)
  }

  /// The lines to submit at checkout. An empty cart cannot be checked out.
  pub fn snapshot(&self) -> Result<Vec<CartLine>> {
    if self.lines.is_empty() {
      return Err(Error::Validation("cart is empty".into()));
    }
    Ok(self.lines.clone())
  }

  /// Empty the cart. Called once, after an order was accepted.
  pub fn clear(&mut self) -> Result<()> {
    self.lines.clear();
    self.persist()
  }

  fn persist(&self) -> Result<()> { self.storage.save(&self.key, &self.lines) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn product_ids(catalog: &Catalog) -> (Uuid, Uuid) {
    let a = catalog.find_by_sku("PARFUM-001").unwrap().id;
    let b = catalog.find_by_sku("COSM-001").unwrap().id;
    (a, b)
  }

  #[test]
  fn add_merges_lines_per_product() {
    let catalog = Catalog::demo();
    let (a, b) = product_ids(&catalog);
    let storage = MemoryCartStorage::default();
    let mut cart = Cart::load(&storage).unwrap();

    assert!(cart.add(&catalog, a, 1).unwrap());
    assert!(cart.add(&catalog, a, 2).unwrap());
    assert!(cart.add(&catalog, b, 1).unwrap());

    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.line(a).unwrap().quantity, 3);
    assert_eq!(cart.item_count(), 4);
  }

  #[test]
  fn add_unknown_product_is_a_noop() {
    let catalog = Catalog::demo();
    let storage = MemoryCartStorage::default();
    let mut cart = Cart::load(&storage).unwrap();

    assert!(!cart.add(&catalog, Uuid::new_v4(), 1).unwrap());
    assert!(cart.is_empty());
    assert!(storage.load(CART_STORAGE_KEY).unwrap().is_none());
  }

  #[test]
  fn decrement_clamps_at_one() {
    let catalog = Catalog::demo();
    let (a, _) = product_ids(&catalog);
    let storage = MemoryCartStorage::default();
    let mut cart = Cart::load(&storage).unwrap();

    cart.add(&catalog, a, 2).unwrap();
    cart.update_quantity(a, -5).unwrap();
    assert_eq!(cart.line(a).unwrap().quantity, 1);

    cart.update_quantity(a, 3).unwrap();
    assert_eq!(cart.line(a).unwrap().quantity, 4);

    cart.update_quantity(Uuid::new_v4(), 1).unwrap();
    assert_eq!(cart.lines().len(), 1);
  }

  #[test]
  fn remove_drops_only_that_line() {
    let catalog = Catalog::demo();
    let (a, b) = product_ids(&catalog);
    let storage = MemoryCartStorage::default();
    let mut cart = Cart::load(&storage).unwrap();

    cart.add(&catalog, a, 1).unwrap();
    cart.add(&catalog, b, 1).unwrap();
    cart.remove(a).unwrap();

    assert!(cart.line(a).is_none());
    assert!(cart.line(b).is_some());
  }

  #[test]
  fn invariants_hold_over_mixed_operations() {
    let catalog = Catalog::demo();
    let ids: Vec<Uuid> = catalog.products.iter().map(|p| p.id).collect();
    let storage = MemoryCartStorage::default();
    let mut cart = Cart::load(&storage).unwrap();

    for step in 0..60_i64 {
      let id = ids[(step as usize * 7) % ids.len()];
      match step % 4 {
        0 | 1 => {
          cart.add(&catalog, id, (step % 3) as u32 + 1).unwrap();
        }
        2 => cart.update_quantity(id, -(step % 5)).unwrap(),
        _ => {
          if step % 8 == 3 {
            cart.remove(id).unwrap();
          }
        }
      }

      let mut seen = std::collections::HashSet::new();
      assert!(cart.lines().iter().all(|l| seen.insert(l.product_id)));
      assert!(cart.lines().iter().all(|l| l.quantity >= 1));
    }
  }

  #[test]
  fn totals_charge_shipping_below_threshold() {
    let catalog = Catalog::demo();
    let (a, b) = product_ids(&catalog);
    let storage = MemoryCartStorage::default();
    let mut cart = Cart::load(&storage).unwrap();
    let rules = ShippingRules::default();

    cart.add(&catalog, a, 2).unwrap();
    cart.add(&catalog, b, 1).unwrap();
    let totals = cart.totals(&rules);
    assert_eq!(totals.subtotal, Decimal::from(389));
    assert_eq!(totals.shipping, Decimal::from(30));
    assert_eq!(totals.total, Decimal::from(419));

    cart.update_quantity(a, 2).unwrap();
    let totals = cart.totals(&rules);
    assert_eq!(totals.subtotal, Decimal::from(689));
    assert_eq!(totals.shipping, Decimal::ZERO);
    assert_eq!(totals.total, Decimal::from(689));
    assert!(totals.ships_free());
    assert_eq!(totals, cart.totals(&rules));
  }

  #[test]
  fn empty_cart_has_no_snapshot() {
    let storage = MemoryCartStorage::default();
    let cart = Cart::load(&storage).unwrap();
    assert!(matches!(cart.snapshot(), Err(Error::Validation(_))));
  }

  #[test]
  fn file_storage_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::demo();
    let (a, b) = product_ids(&catalog);

    let before = {
      let mut cart = Cart::load(FileCartStorage::new(dir.path())).unwrap();
      cart.add(&catalog, b, 1).unwrap();
      cart.add(&catalog, a, 3).unwrap();
      cart.lines().to_vec()
    };

    let reloaded = Cart::load(FileCartStorage::new(dir.path())).unwrap();
    assert_eq!(reloaded.lines(), before.as_slice());
    assert_eq!(reloaded.lines()[0].sku, "COSM-001");
  }

  #[test]
  fn persisted_shape_uses_short_field_names() {
    let catalog = Catalog::demo();
    let (a, _) = product_ids(&catalog);
    let storage = MemoryCartStorage::default();
    let mut cart = Cart::load(&storage).unwrap();
    cart.add(&catalog, a, 2).unwrap();

    let entries = storage.entries.lock().unwrap();
    let raw: serde_json::Value =
      serde_json::from_str(entries.get(CART_STORAGE_KEY).unwrap()).unwrap();
    assert_eq!(raw[0]["qty"], 2);
    assert_eq!(raw[0]["sku"], "PARFUM-001");
    assert_eq!(raw[0]["price"], 150.0);
  }

  #[test]
  fn clear_persists_empty_list() {
    let catalog = Catalog::demo();
    let (a, _) = product_ids(&catalog);
    let storage = MemoryCartStorage::default();
    let mut cart = Cart::load(&storage).unwrap();
    cart.add(&catalog, a, 1).unwrap();
    cart.clear().unwrap();

    assert_eq!(storage.load(CART_STORAGE_KEY).unwrap(), Some(vec![]));
  }

  fn line(sku: &str, price: Decimal, qty: u32) -> CartLine {
    CartLine {
      product_id: Uuid::new_v4(),
      sku:        sku.into(),
      name:       sku.into(),
      unit_price: price,
      quantity:   qty,
      image:      None,
    }
  }

  #[test]
  fn checked_totals_reject_negative_prices() {
    let lines = [line("A", Decimal::from(200), 1), line("B", Decimal::from(-500), 1)];
    let err = CartTotals::checked(&lines, &ShippingRules::default()).unwrap_err();
    assert!(matches!(err, Error::Validation(msg) if msg.contains("B")));
  }

  #[test]
  fn checked_totals_reject_overflow() {
    let lines = [line("A", Decimal::MAX, 2)];
    assert!(matches!(
      CartTotals::checked(&lines, &ShippingRules::default()),
      Err(Error::Validation(_))
    ));

    let lines = [line("A", Decimal::MAX, 1), line("B", Decimal::MAX, 1)];
    assert!(CartTotals::checked(&lines, &ShippingRules::default()).is_err());
  }

  #[test]
  fn display_totals_saturate_instead_of_panicking() {
    let lines = [line("A", Decimal::MAX, 2), line("B", Decimal::ONE, u32::MAX)];
    let totals = CartTotals::compute(&lines, &ShippingRules::default());
    assert_eq!(totals.subtotal, Decimal::MAX);
    assert_eq!(totals.total, Decimal::MAX);
  }

  #[test]
  fn checked_totals_match_display_totals_for_sane_carts() {
    let lines = [line("A", Decimal::from(150), 2), line("B", Decimal::from(89), 1)];
    let rules = ShippingRules::default();
    assert_eq!(CartTotals::checked(&lines, &rules).unwrap(), CartTotals::compute(&lines, &rules));
  }
}
