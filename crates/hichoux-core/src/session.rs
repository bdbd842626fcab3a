//! A browsing session: the loaded catalog, the cart and the active category
//! filter.

use uuid::Uuid;

use crate::{
  Result,
  cart::{Cart, CartLine, CartStorage, CartTotals},
  catalog::{Catalog, CategoryFilter, PriceBand, Product, ProductSort, sort_products},
  config::ShippingRules,
};

pub struct Session<C: CartStorage> {
  catalog:  Catalog,
  cart:     Cart<C>,
  category: CategoryFilter,
  /// Whether the catalog is the built-in demo catalog.
  demo:     bool,
}

impl<C: CartStorage> Session<C> {
  /// Start a session. A catalog that failed to load, or came back empty,
  /// is replaced with [`Catalog::demo`].
  pub fn open(catalog: Result<Catalog>, storage: C) -> Result<Self> {
    let (catalog, demo) = match catalog {
      Ok(catalog) if !catalog.products.is_empty() => (catalog, false),
      Ok(_) => {
        tracing::info!("catalog is empty; using demo products");
        (Catalog::demo(), true)
      }
      Err(err) => {
        tracing::warn!(error = %err, "catalog load failed; using demo products");
        (Catalog::demo(), true)
      }
    };
    let cart = Cart::load(storage)?;
    Ok(Self { catalog, cart, category: CategoryFilter::All, demo })
  }

  pub fn catalog(&self) -> &Catalog { &self.catalog }

  pub fn cart(&self) -> &Cart<C> { &self.cart }

  pub fn is_demo(&self) -> bool { self.demo }

  pub fn category(&self) -> &CategoryFilter { &self.category }

  pub fn set_category(&mut self, category: CategoryFilter) { self.category = category; }

  /// Products under the active category and `band`, in `sort` order, or
  /// catalog order when `sort` is `None`.
  pub fn visible_products(&self, band: PriceBand, sort: Option<ProductSort>) -> Vec<&Product> {
    let mut products = self.catalog.filter(&self.category, band);
    if let Some(sort) = sort {
      sort_products(&mut products, sort);
    }
    products
  }

  /// Resolve a product by slug or SKU.
  pub fn lookup(&self, key: &str) -> Option<&Product> {
    self.catalog.find_by_slug(key).or_else(|| self.catalog.find_by_sku(key))
  }

  pub fn add_to_cart(&mut self, product_id: Uuid, qty: u32) -> Result<bool> {
    self.cart.add(&self.catalog, product_id, qty)
  }

  pub fn change_quantity(&mut self, product_id: Uuid, delta: i64) -> Result<()> {
    self.cart.update_quantity(product_id, delta)
  }

  pub fn remove_from_cart(&mut self, product_id: Uuid) -> Result<()> {
    self.cart.remove(product_id)
  }

  pub fn totals(&self, rules: &ShippingRules) -> CartTotals { self.cart.totals(rules) }

  /// The lines to submit; fails on an empty cart.
  pub fn checkout_lines(&self) -> Result<Vec<CartLine>> { self.cart.snapshot() }

  /// Clear the cart after the order was accepted.
  pub fn complete_checkout(&mut self) -> Result<()> { self.cart.clear() }

  pub fn clear_cart(&mut self) -> Result<()> { self.cart.clear() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Error, cart::MemoryCartStorage};

  #[test]
  fn failed_catalog_load_falls_back_to_demo() {
    let storage = MemoryCartStorage::default();
    let session = Session::open(Err(Error::NotConnected), &storage).unwrap();
    assert!(session.is_demo());
    assert_eq!(session.catalog().products.len(), 6);
  }

  #[test]
  fn category_filter_narrows_visible_products() {
    let storage = MemoryCartStorage::default();
    let mut session = Session::open(Ok(Catalog::demo()), &storage).unwrap();
    assert!(!session.is_demo());

    session.set_category("cosmetique".parse().unwrap());
    let skus: Vec<_> = session
      .visible_products(PriceBand::All, Some(ProductSort::PriceAsc))
      .iter()
      .map(|p| p.sku.as_str())
      .collect();
    assert_eq!(skus, ["COSM-001", "COSM-002"]);
  }

  #[test]
  fn cart_survives_a_new_session_over_the_same_storage() {
    let storage = MemoryCartStorage::default();
    let mut session = Session::open(Ok(Catalog::demo()), &storage).unwrap();
    let oud = session.lookup("PARFUM-001").unwrap().id;
    assert!(session.add_to_cart(oud, 2).unwrap());

    let reopened = Session::open(Ok(Catalog::demo()), &storage).unwrap();
    assert_eq!(reopened.cart().item_count(), 2);

    let mut reopened = reopened;
    reopened.complete_checkout().unwrap();
    assert!(reopened.checkout_lines().is_err());
  }
}
