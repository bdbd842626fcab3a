//! `hichoux` terminal client for the Hichoux storefront.
//!
//! # Usage
//!
//! ```
//! hichoux products --category homme --sort price-asc
//! hichoux cart add PARFUM-001 --qty 2
//! hichoux checkout --name "Salma" --phone 0612345678 --city Rabat --address "12 rue Atlas"
//! hichoux track HCX00000001
//! ```

mod app;
mod client;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use app::{App, CartEdit};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use hichoux_core::{
  catalog::{CategoryFilter, PriceBand, ProductSort},
  order::CustomerForm,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "hichoux", about = "Terminal client for the Hichoux storefront")]
struct Args {
  /// Path to a TOML config file (url, data_dir).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the storefront API (default: http://localhost:8080).
  #[arg(long, env = "HICHOUX_URL")]
  url: Option<String>,

  /// Directory holding the cart file.
  #[arg(long, env = "HICHOUX_DATA_DIR", value_name = "DIR")]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List the catalog.
  Products {
    /// Category slug or name; `all` for every category.
    #[arg(long, default_value = "all")]
    category: CategoryFilter,
    /// Price band: all, 0-100, 100-200 or 200+.
    #[arg(long, default_value = "all")]
    price:    PriceBand,
    /// Sort order: price-asc, price-desc or name.
    #[arg(long)]
    sort:     Option<ProductSort>,
    /// Only featured products.
    #[arg(long)]
    featured: bool,
  },
  /// Show one product by slug or SKU.
  Product { key: String },
  /// Show or edit the cart.
  Cart {
    #[command(subcommand)]
    action: Option<CartAction>,
  },
  /// Submit the cart as a cash-on-delivery order.
  Checkout {
    #[arg(long)]
    name:    String,
    #[arg(long)]
    phone:   String,
    #[arg(long)]
    city:    String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    email:   Option<String>,
    #[arg(long, default_value = "")]
    notes:   String,
  },
  /// Track an order by number or phone.
  Track { query: String },
}

#[derive(Subcommand, Debug)]
enum CartAction {
  Show,
  Add {
    /// Product slug or SKU.
    product: String,
    #[arg(long, default_value_t = 1)]
    qty:     u32,
  },
  Inc { product: String },
  Dec { product: String },
  Remove { product: String },
  Clear,
}

impl CartAction {
  /// The mutation to apply; `None` just shows the cart.
  fn into_edit(self) -> Option<CartEdit> {
    Some(match self {
      CartAction::Show => return None,
      CartAction::Add { product, qty } => CartEdit::Add { product, qty },
      CartAction::Inc { product } => CartEdit::Inc(product),
      CartAction::Dec { product } => CartEdit::Dec(product),
      CartAction::Remove { product } => CartEdit::Remove(product),
      CartAction::Clear => CartEdit::Clear,
    })
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  data_dir: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
  std::env::var_os("HOME")
    .map(|home| PathBuf::from(home).join(".local/share/hichoux"))
    .unwrap_or_else(|| PathBuf::from(".hichoux"))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
  };
  let data_dir = args.data_dir.or(file_cfg.data_dir).unwrap_or_else(default_data_dir);

  let client = ApiClient::new(api_config)?;
  let mut app = App::start(client, data_dir).await?;

  let output = match args.command {
    Command::Products { category, price, sort, featured } => {
      app.products(category, price, sort, featured)
    }
    Command::Product { key } => app.product(&key).await?,
    Command::Cart { action } => match action.and_then(CartAction::into_edit) {
      Some(edit) => app.edit_cart(edit)?,
      None => app.cart(),
    },
    Command::Checkout { name, phone, city, address, email, notes } => {
      let form = CustomerForm { name, phone, email, address, city, notes };
      app.checkout(form).await?
    }
    Command::Track { query } => app.track(&query).await?,
  };
  print!("{output}");
  Ok(())
}
