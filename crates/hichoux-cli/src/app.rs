//! Command handlers over one browsing session.

use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use hichoux_core::{
  ResultExt as _,
  cart::FileCartStorage,
  catalog::{CategoryFilter, PriceBand, ProductSort},
  config::StoreConfig,
  order::CustomerForm,
  session::Session,
};

use crate::{client::ApiClient, ui};

/// A cart mutation requested on the command line.
#[derive(Debug, Clone)]
pub enum CartEdit {
  Add { product: String, qty: u32 },
  Inc(String),
  Dec(String),
  Remove(String),
  Clear,
}

/// Top-level application state: the API client, the store configuration and
/// the session holding the catalog and the durable cart.
pub struct App {
  pub client:  ApiClient,
  pub config:  StoreConfig,
  pub session: Session<FileCartStorage>,
}

/// Carry an API failure into the core error the session degrades on.
fn unreachable_api(err: anyhow::Error) -> hichoux_core::Error {
  hichoux_core::Error::Persistence(err.into())
}

impl App {
  /// Load the catalog and store configuration from the API. Either may be
  /// unavailable; the session then runs on the demo catalog and the default
  /// configuration.
  pub async fn start(client: ApiClient, data_dir: PathBuf) -> Result<Self> {
    let catalog = client.catalog().await.map_err(unreachable_api);
    let config = client
      .store_config()
      .await
      .map_err(unreachable_api)
      .or_degraded("store configuration");

    std::fs::create_dir_all(&data_dir)?;
    let session = Session::open(catalog, FileCartStorage::new(data_dir))?;
    Ok(Self { client, config, session })
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  pub fn products(
    &mut self,
    category: CategoryFilter,
    band: PriceBand,
    sort: Option<ProductSort>,
    featured: bool,
  ) -> String {
    self.session.set_category(category);
    let products = self.session.visible_products(band, sort);

    let mut out = String::new();
    if self.session.is_demo() {
      out.push_str("(catalogue de démonstration)\n");
    }
    for product in products.into_iter().filter(|p| !featured || p.is_featured) {
      out.push_str(&ui::product_line(product, &self.config));
      out.push('\n');
    }
    out
  }

  pub async fn product(&self, key: &str) -> Result<String> {
    let product = match self.session.lookup(key) {
      Some(p) => p.clone(),
      None => self
        .client
        .product(key)
        .await?
        .ok_or_else(|| anyhow!("produit introuvable : {key}"))?,
    };
    Ok(ui::product_card(&product, &self.config))
  }

  // ── Cart ──────────────────────────────────────────────────────────────────

  pub fn cart(&self) -> String {
    let cart = self.session.cart();
    let totals = self.session.totals(&self.config.shipping);
    let mut out = ui::cart_summary(cart.lines(), &totals, &self.config);
    if !cart.is_empty() {
      out.push_str(&format!("{} article(s)\n", cart.item_count()));
    }
    out
  }

  pub fn edit_cart(&mut self, edit: CartEdit) -> Result<String> {
    match edit {
      CartEdit::Add { product, qty } => {
        let id = self.product_id(&product)?;
        if self.session.add_to_cart(id, qty.max(1))? {
          return Ok(format!("Ajouté au panier.\n{}", self.cart()));
        }
      }
      CartEdit::Inc(product) => {
        let id = self.product_id(&product)?;
        self.session.change_quantity(id, 1)?;
      }
      CartEdit::Dec(product) => {
        let id = self.product_id(&product)?;
        self.session.change_quantity(id, -1)?;
      }
      CartEdit::Remove(product) => {
        let id = self.product_id(&product)?;
        self.session.remove_from_cart(id)?;
      }
      CartEdit::Clear => self.session.clear_cart()?,
    }
    Ok(self.cart())
  }

  /// Resolve a slug or SKU against the catalog, then against the cart so
  /// lines for products that left the catalog can still be edited.
  fn product_id(&self, key: &str) -> Result<uuid::Uuid> {
    if let Some(product) = self.session.lookup(key) {
      return Ok(product.id);
    }
    self
      .session
      .cart()
      .lines()
      .iter()
      .find(|l| l.sku == key)
      .map(|l| l.product_id)
      .ok_or_else(|| anyhow!("produit introuvable : {key}"))
  }

  // ── Checkout / tracking ───────────────────────────────────────────────────

  pub async fn checkout(&mut self, form: CustomerForm) -> Result<String> {
    let lines = self.session.checkout_lines()?;
    let submission = self.client.checkout(&lines, &form).await?;
    self.session.complete_checkout()?;

    let mut out = format!(
      "Merci ! Votre commande {} est enregistrée.\nTotal à payer à la livraison : {}\n",
      submission.order_number,
      self.config.format_price(submission.totals.total)
    );
    if submission.is_demo() {
      out.push_str("(mode démonstration : la commande n'a pas été enregistrée)\n");
    }
    let message = format!("Bonjour, je viens de passer la commande {}", submission.order_number);
    out.push_str(&format!(
      "WhatsApp : {}\n",
      self.config.whatsapp_link(&self.config.store.whatsapp, Some(&message))
    ));
    Ok(out)
  }

  pub async fn track(&self, query: &str) -> Result<String> {
    if query.trim().is_empty() {
      bail!("saisissez un numéro de commande ou de téléphone");
    }
    let result = self.client.track(query.trim()).await?;
    match result.order {
      Some(details) if result.found => {
        Ok(ui::order_summary(&details, result.tracking_url.as_deref(), &self.config))
      }
      _ => Ok("Aucune commande trouvée.\n".to_owned()),
    }
  }
}

#[cfg(test)]
mod tests {
  use hichoux_core::catalog::Catalog;

  use super::*;
  use crate::client::ApiConfig;

  /// An app over the demo catalog; no server is contacted.
  fn app(dir: &std::path::Path) -> App {
    let client = ApiClient::new(ApiConfig { base_url: "http://127.0.0.1:9".into() }).unwrap();
    let session = Session::open(Ok(Catalog::default()), FileCartStorage::new(dir)).unwrap();
    App { client, config: StoreConfig::default(), session }
  }

  #[tokio::test]
  async fn start_degrades_when_the_api_is_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(ApiConfig { base_url: "http://127.0.0.1:9".into() }).unwrap();

    let app = App::start(client, dir.path().join("data")).await.unwrap();
    assert!(app.session.is_demo());
    assert_eq!(app.config.shipping, hichoux_core::config::ShippingRules::default());
  }

  #[test]
  fn cart_edits_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let sku = Catalog::demo().products[0].sku.clone();

    let mut first = app(dir.path());
    first.edit_cart(CartEdit::Add { product: sku.clone(), qty: 2 }).unwrap();
    first.edit_cart(CartEdit::Inc(sku.clone())).unwrap();
    assert!(dir.path().join("hichoux_cart.json").exists());

    let second = app(dir.path());
    assert_eq!(second.session.cart().item_count(), 3);
  }

  #[test]
  fn decrement_stops_at_one() {
    let dir = tempfile::tempdir().unwrap();
    let sku = Catalog::demo().products[0].sku.clone();

    let mut app = app(dir.path());
    app.edit_cart(CartEdit::Add { product: sku.clone(), qty: 1 }).unwrap();
    app.edit_cart(CartEdit::Dec(sku.clone())).unwrap();
    assert_eq!(app.session.cart().item_count(), 1);

    app.edit_cart(CartEdit::Remove(sku)).unwrap();
    assert!(app.session.cart().is_empty());
  }

  #[test]
  fn unknown_product_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app(dir.path());
    assert!(app.edit_cart(CartEdit::Inc("NOPE".into())).is_err());
  }

  #[test]
  fn demo_listing_is_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app(dir.path());
    let out = app.products(CategoryFilter::All, PriceBand::All, None, false);
    assert!(out.starts_with("(catalogue de démonstration)"));
  }
}
