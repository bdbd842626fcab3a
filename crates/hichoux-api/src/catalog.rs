//! Handlers for the catalog endpoints.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use hichoux_core::{
  catalog::{Catalog, Category, Product},
  store::{CatalogRepository as _, ProductQuery, StoreBackend},
};

use crate::{AppState, error::ApiError};

/// Apply a product query to the demo catalog.
fn demo_products(query: &ProductQuery) -> Vec<Product> {
  Catalog::demo()
    .products
    .into_iter()
    .filter(|p| p.is_active)
    .filter(|p| !query.featured || p.is_featured)
    .filter(|p| {
      query
        .category
        .as_deref()
        .is_none_or(|slug| p.category.as_ref().is_some_and(|c| c.slug == slug))
    })
    .take(query.limit.unwrap_or(usize::MAX))
    .collect()
}

/// `GET /products[?featured=true][&category=<slug>][&limit=<n>]`
pub async fn list<S: StoreBackend>(
  State(state): State<AppState<S>>,
  Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
  let Some(store) = state.backend.store() else { return Ok(Json(demo_products(&query))) };
  let products = store
    .list_products(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(products))
}

/// `GET /products/{slug}`
pub async fn get_one<S: StoreBackend>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Product>, ApiError> {
  let product = match state.backend.store() {
    Some(store) => store
      .product_by_slug(&slug)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?,
    None => Catalog::demo().find_by_slug(&slug).cloned(),
  };
  product
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("product {slug}")))
}

/// `GET /categories`
pub async fn categories<S: StoreBackend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Category>>, ApiError> {
  let Some(store) = state.backend.store() else { return Ok(Json(Catalog::demo().categories)) };
  let categories = store
    .list_categories()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(categories))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn demo_query_filters_featured_and_limits() {
    let all = demo_products(&ProductQuery::default());
    assert_eq!(all.len(), Catalog::demo().products.len());

    let featured = demo_products(&ProductQuery { featured: true, ..Default::default() });
    assert!(featured.iter().all(|p| p.is_featured));

    let one = demo_products(&ProductQuery { limit: Some(1), ..Default::default() });
    assert_eq!(one.len(), 1);
  }
}
