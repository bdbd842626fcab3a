//! Async HTTP client wrapping the storefront JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use hichoux_core::{
  cart::CartLine,
  catalog::{Catalog, Category, Product},
  config::StoreConfig,
  lifecycle::Submission,
  order::{CustomerForm, OrderDetails},
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

/// Connection settings for the storefront API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Body of `GET /track`.
#[derive(Debug, Deserialize)]
pub struct TrackResult {
  pub found:        bool,
  #[serde(default)]
  pub order:        Option<OrderDetails>,
  #[serde(default)]
  pub tracking_url: Option<String>,
}

#[derive(Serialize)]
struct CheckoutBody<'a> {
  lines:    &'a [CartLine],
  customer: &'a CustomerForm,
}

/// Async HTTP client for the storefront API.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  /// `GET /products` and `GET /categories`
  pub async fn catalog(&self) -> Result<Catalog> {
    let products: Vec<Product> = self.get_json("/products").await?;
    let categories: Vec<Category> = self.get_json("/categories").await?;
    Ok(Catalog::new(products, categories))
  }

  /// `GET /products/{slug}`; `None` on 404.
  pub async fn product(&self, slug: &str) -> Result<Option<Product>> {
    let resp = self
      .client
      .get(self.url(&format!("/products/{slug}")))
      .send()
      .await
      .context("GET /products/{slug} failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let resp = check(resp, "GET /products/{slug}").await?;
    resp.json().await.context("deserialising product").map(Some)
  }

  /// `GET /config`
  pub async fn store_config(&self) -> Result<StoreConfig> { self.get_json("/config").await }

  // ── Orders ────────────────────────────────────────────────────────────────

  /// `POST /orders`
  pub async fn checkout(&self, lines: &[CartLine], customer: &CustomerForm) -> Result<Submission> {
    let resp = self
      .client
      .post(self.url("/orders"))
      .json(&CheckoutBody { lines, customer })
      .send()
      .await
      .context("POST /orders failed")?;
    let resp = check(resp, "POST /orders").await?;
    resp.json().await.context("deserialising submission")
  }

  /// `GET /track?q=<query>`
  pub async fn track(&self, query: &str) -> Result<TrackResult> {
    let resp = self
      .client
      .get(self.url("/track"))
      .query(&[("q", query)])
      .send()
      .await
      .context("GET /track failed")?;
    let resp = check(resp, "GET /track").await?;
    resp.json().await.context("deserialising tracking result")
  }

  async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
    let resp = self
      .client
      .get(self.url(path))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    let resp = check(resp, &format!("GET {path}")).await?;
    resp.json().await.with_context(|| format!("deserialising {path}"))
  }
}

/// Turn a non-success response into an error carrying the API's message.
async fn check(resp: Response, what: &str) -> Result<Response> {
  if resp.status().is_success() {
    return Ok(resp);
  }
  let status = resp.status();
  let message = resp
    .json::<serde_json::Value>()
    .await
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    .unwrap_or_default();
  Err(anyhow!("{what} → {status} {message}"))
}
