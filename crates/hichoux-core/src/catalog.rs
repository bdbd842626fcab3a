//! Products, categories and the in-memory catalog the storefront browses.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Products with fewer units than this are badged as limited stock.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

// ─── Records ─────────────────────────────────────────────────────────────────

/// The category summary embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
  pub id:   Uuid,
  pub name: String,
  pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub id:         Uuid,
  pub name:       String,
  pub slug:       String,
  pub sort_order: i32,
  pub is_active:  bool,
}

impl Category {
  pub fn summary(&self) -> CategoryRef {
    CategoryRef { id: self.id, name: self.name.clone(), slug: self.slug.clone() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id:            Uuid,
  pub sku:           String,
  pub name:          String,
  pub slug:          String,
  pub description:   String,
  pub price:         Decimal,
  /// Pre-discount price; only meaningful when greater than `price`.
  pub compare_price: Option<Decimal>,
  pub stock:         u32,
  pub category:      Option<CategoryRef>,
  pub is_featured:   bool,
  pub is_active:     bool,
  pub images:        Vec<String>,
  pub created_at:    DateTime<Utc>,
}

impl Product {
  /// Whole-percent discount against `compare_price`, or 0.
  pub fn discount_percent(&self) -> u32 {
    match self.compare_price {
      Some(compare) if compare > self.price && !compare.is_zero() => {
        let ratio = Decimal::ONE - self.price / compare;
        (ratio * Decimal::ONE_HUNDRED).round().to_u32().unwrap_or(0)
      }
      _ => 0,
    }
  }

  pub fn is_low_stock(&self) -> bool { self.stock < LOW_STOCK_THRESHOLD }

  pub fn primary_image(&self) -> Option<&str> {
    self.images.first().map(String::as_str)
  }

  fn matches_category(&self, slug: &str) -> bool {
    self.category.as_ref().is_some_and(|c| {
      c.slug == slug || c.name.to_lowercase() == slug
    })
  }
}

/// Input for creating a product through catalog management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
  pub sku:           String,
  pub name:          String,
  pub slug:          String,
  #[serde(default)]
  pub description:   String,
  pub price:         Decimal,
  pub compare_price: Option<Decimal>,
  #[serde(default)]
  pub stock:         u32,
  pub category_id:   Option<Uuid>,
  #[serde(default)]
  pub is_featured:   bool,
  #[serde(default)]
  pub images:        Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
  pub name:       String,
  pub slug:       String,
  #[serde(default)]
  pub sort_order: i32,
}

/// Partial product update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
  pub name:          Option<String>,
  pub description:   Option<String>,
  pub price:         Option<Decimal>,
  pub compare_price: Option<Decimal>,
  pub stock:         Option<u32>,
  pub is_featured:   Option<bool>,
  pub images:        Option<Vec<String>>,
}

// ─── Filters ─────────────────────────────────────────────────────────────────

/// The category radio on the catalog page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
  #[default]
  All,
  /// Matches a category slug, or a category name compared lowercase.
  Slug(String),
}

impl FromStr for CategoryFilter {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s {
      "" | "all" => Self::All,
      other => Self::Slug(other.to_owned()),
    })
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriceBand {
  #[default]
  All,
  /// Strictly below 100.
  Under100,
  /// 100 to 200 inclusive.
  From100To200,
  /// Strictly above 200.
  Over200,
}

impl PriceBand {
  pub fn contains(self, price: Decimal) -> bool {
    let hundred = Decimal::ONE_HUNDRED;
    let two_hundred = Decimal::from(200);
    match self {
      Self::All => true,
      Self::Under100 => price < hundred,
      Self::From100To200 => price >= hundred && price <= two_hundred,
      Self::Over200 => price > two_hundred,
    }
  }
}

impl FromStr for PriceBand {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "all" => Ok(Self::All),
      "0-100" => Ok(Self::Under100),
      "100-200" => Ok(Self::From100To200),
      "200+" => Ok(Self::Over200),
      other => Err(Error::Validation(format!("unknown price band {other:?}"))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
  PriceAsc,
  PriceDesc,
  Name,
}

impl FromStr for ProductSort {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "price-asc" => Ok(Self::PriceAsc),
      "price-desc" => Ok(Self::PriceDesc),
      "name" => Ok(Self::Name),
      other => Err(Error::Validation(format!("unknown sort order {other:?}"))),
    }
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// The products and categories loaded for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
  pub products:   Vec<Product>,
  pub categories: Vec<Category>,
}

impl Catalog {
  pub fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
    Self { products, categories }
  }

  pub fn find(&self, id: Uuid) -> Option<&Product> {
    self.products.iter().find(|p| p.id == id)
  }

  pub fn find_by_slug(&self, slug: &str) -> Option<&Product> {
    self.products.iter().find(|p| p.slug == slug)
  }

  pub fn find_by_sku(&self, sku: &str) -> Option<&Product> {
    self.products.iter().find(|p| p.sku == sku)
  }

  pub fn featured(&self) -> Vec<&Product> {
    self.products.iter().filter(|p| p.is_featured).collect()
  }

  pub fn in_category(&self, filter: &CategoryFilter) -> Vec<&Product> {
    self.filter(filter, PriceBand::All)
  }

  pub fn filter(&self, category: &CategoryFilter, band: PriceBand) -> Vec<&Product> {
    self
      .products
      .iter()
      .filter(|p| match category {
        CategoryFilter::All => true,
        CategoryFilter::Slug(slug) => p.matches_category(slug),
      })
      .filter(|p| band.contains(p.price))
      .collect()
  }

  /// A sorted copy of the whole catalog; the stored order is untouched.
  pub fn sorted(&self, sort: ProductSort) -> Vec<&Product> {
    let mut products: Vec<&Product> = self.products.iter().collect();
    sort_products(&mut products, sort);
    products
  }

  /// The six perfumes and cosmetics shown when no backend is connected.
  pub fn demo() -> Self {
    let categories = vec![
      demo_category(1, "Homme", "homme"),
      demo_category(2, "Femme", "femme"),
      demo_category(3, "Unisexe", "unisexe"),
      demo_category(4, "Cosmétique", "cosmetique"),
    ];
    let cat = |i: usize| Some(categories[i].summary());

    let products = vec![
      demo_product(1, "PARFUM-001", "Parfum Royal Oud", "parfum-royal-oud", 150, 199, 45, cat(0), true),
      demo_product(2, "PARFUM-002", "Essence de Rose", "essence-de-rose", 200, 250, 32, cat(1), true),
      demo_product(3, "PARFUM-003", "Amber Nights", "amber-nights", 120, 150, 28, cat(2), true),
      demo_product(4, "PARFUM-004", "Musk Premium", "musk-premium", 180, 220, 15, cat(0), false),
      demo_product(5, "COSM-001", "Crème Hydratante", "creme-hydratante", 89, 120, 60, cat(3), false),
      demo_product(6, "COSM-002", "Sérum Anti-âge", "serum-anti-age", 250, 300, 25, cat(3), true),
    ];

    Self { products, categories }
  }
}

pub fn sort_products(products: &mut [&Product], sort: ProductSort) {
  match sort {
    ProductSort::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
    ProductSort::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
    ProductSort::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
  }
}

fn demo_id(n: u128) -> Uuid { Uuid::from_u128(n) }

fn demo_category(n: u128, name: &str, slug: &str) -> Category {
  Category {
    id:         demo_id(0x100 + n),
    name:       name.into(),
    slug:       slug.into(),
    sort_order: n as i32,
    is_active:  true,
  }
}

#[allow(clippy::too_many_arguments)]
fn demo_product(
  n: u128,
  sku: &str,
  name: &str,
  slug: &str,
  price: i64,
  compare: i64,
  stock: u32,
  category: Option<CategoryRef>,
  featured: bool,
) -> Product {
  Product {
    id: demo_id(n),
    sku: sku.into(),
    name: name.into(),
    slug: slug.into(),
    description: String::new(),
    price: Decimal::from(price),
    compare_price: Some(Decimal::from(compare)),
    stock,
    category,
    is_featured: featured,
    is_active: true,
    images: vec![format!(
      "https://via.placeholder.com/400x400/1a1a1a/D4AF37?text={}",
      name.replace(' ', "+")
    )],
    created_at: DateTime::<Utc>::UNIX_EPOCH,
  }
}
