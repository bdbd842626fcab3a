//! Plain-text rendering of products, the cart and tracked orders.

use hichoux_core::{
  cart::{CartLine, CartTotals},
  catalog::Product,
  config::StoreConfig,
  order::{OrderDetails, TrackingProgress},
};

/// One catalog row: SKU, name, price and any discount or stock warning.
pub fn product_line(product: &Product, config: &StoreConfig) -> String {
  let mut line = format!(
    "{:<12} {:<32} {:>10}",
    product.sku,
    product.name,
    config.format_price(product.price)
  );
  if product.discount_percent() > 0 {
    line.push_str(&format!("  -{}%", product.discount_percent()));
  }
  if product.is_low_stock() {
    line.push_str(&format!("  (plus que {} en stock)", product.stock));
  }
  line
}

/// The product page.
pub fn product_card(product: &Product, config: &StoreConfig) -> String {
  let mut out = format!("{}\n{}\n", product.name, "=".repeat(product.name.chars().count()));
  out.push_str(&format!("SKU      {}\n", product.sku));
  out.push_str(&format!("Prix     {}", config.format_price(product.price)));
  if let Some(compare) = product.compare_price.filter(|_| product.discount_percent() > 0) {
    out.push_str(&format!(
      " (au lieu de {}, -{}%)",
      config.format_price(compare),
      product.discount_percent()
    ));
  }
  out.push('\n');
  if let Some(category) = &product.category {
    out.push_str(&format!("Catégorie {}\n", category.name));
  }
  out.push_str(&format!("Stock    {}\n", product.stock));
  if !product.description.is_empty() {
    out.push_str(&format!("\n{}\n", product.description));
  }
  out
}

/// Cart lines followed by subtotal, shipping and total.
pub fn cart_summary(lines: &[CartLine], totals: &CartTotals, config: &StoreConfig) -> String {
  if lines.is_empty() {
    return "Votre panier est vide.\n".to_owned();
  }
  let shipping = if totals.ships_free() {
    "Gratuite".to_owned()
  } else {
    config.format_price(totals.shipping)
  };

  let mut rows: Vec<String> = lines
    .iter()
    .map(|line| {
      format!(
        "{:>3} x {:<32} {:>10}",
        line.quantity,
        line.name,
        config.format_price(line.line_total())
      )
    })
    .collect();
  rows.push(format!("Sous-total  {}", config.format_price(totals.subtotal)));
  rows.push(format!("Livraison   {shipping}"));
  rows.push(format!("Total       {}", config.format_price(totals.total)));
  rows.join("\n") + "\n"
}

/// The tracking view: status, step progress, items and the carrier link.
pub fn order_summary(
  details: &OrderDetails,
  tracking_url: Option<&str>,
  config: &StoreConfig,
) -> String {
  let order = &details.order;
  let style = config.status_style(order.status.as_str());
  let progress = TrackingProgress::from(order.status);

  let mut rows = vec![
    format!("Commande {}", order.order_number),
    format!("Statut    {} ({}/{})", style.label, progress.completed, progress.total),
    format!("Client    {} · {}", order.customer_name, order.shipping_city),
    format!("Date      {}", order.created_at.format("%d/%m/%Y %H:%M")),
  ];
  rows.extend(details.items.iter().map(|i| format!("  {:>3} x {}", i.quantity, i.product_name)));
  rows.push(format!("Total     {}", config.format_price(order.total)));
  if let Some(url) = tracking_url {
    rows.push(format!("Suivi     {url}"));
  }
  rows.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
  use hichoux_core::{catalog::Catalog, config::ShippingRules};
  use rust_decimal::Decimal;
  use uuid::Uuid;

  use super::*;

  fn line(price: i64, qty: u32) -> CartLine {
    CartLine {
      product_id: Uuid::new_v4(),
      sku:        "PARFUM-001".into(),
      name:       "Parfum Oud".into(),
      unit_price: Decimal::from(price),
      quantity:   qty,
      image:      None,
    }
  }

  #[test]
  fn cart_summary_shows_free_shipping() {
    let config = StoreConfig::default();
    let lines = [line(250, 2)];
    let totals = CartTotals::compute(&lines, &ShippingRules::default());
    let out = cart_summary(&lines, &totals, &config);
    assert!(out.contains("Gratuite"), "{out}");
    assert!(out.contains("500 DH"), "{out}");
  }

  #[test]
  fn cart_summary_has_one_row_per_line_then_totals() {
    let config = StoreConfig::default();
    let lines = [line(100, 1), line(50, 3)];
    let totals = CartTotals::compute(&lines, &ShippingRules::default());
    let out = cart_summary(&lines, &totals, &config);

    let rows: Vec<&str> = out.lines().collect();
    assert_eq!(rows.len(), 5);
    assert!(rows[0].starts_with("  1 x Parfum Oud"));
    assert!(rows[4].starts_with("Total"));
    assert!(out.ends_with('\n'));
  }

  #[test]
  fn empty_cart_has_its_own_message() {
    let config = StoreConfig::default();
    let out = cart_summary(&[], &CartTotals::compute(&[], &ShippingRules::default()), &config);
    assert_eq!(out, "Votre panier est vide.\n");
  }

  #[test]
  fn product_line_mentions_price() {
    let config = StoreConfig::default();
    let catalog = Catalog::demo();
    let product = &catalog.products[0];
    assert!(product_line(product, &config).contains(&config.format_price(product.price)));
  }
}
