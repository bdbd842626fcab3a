//! Back-office read endpoints, settings and the public store configuration.

use axum::{
  Json,
  extract::{Path, State},
};
use hichoux_core::{
  ResultExt as _,
  config::StoreConfig,
  customer::Customer,
  lifecycle::DashboardStats,
  store::{CustomerRepository as _, SettingsRepository as _, StoreBackend, TeamRepository as _},
  team::{Setting, TeamMember},
};

use crate::{AppState, error::ApiError};

/// `GET /customers`
pub async fn customers<S: StoreBackend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
  let Some(store) = state.backend.store() else { return Ok(Json(Vec::new())) };
  let customers = store
    .list_customers()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(customers))
}

/// `GET /settings`
pub async fn settings<S: StoreBackend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Setting>>, ApiError> {
  let Some(store) = state.backend.store() else { return Ok(Json(Vec::new())) };
  let settings = store
    .list_settings()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(settings))
}

/// `PUT /settings/{key}`; the body is stored as the value.
pub async fn put_setting<S: StoreBackend>(
  State(state): State<AppState<S>>,
  Path(key): Path<String>,
  Json(value): Json<serde_json::Value>,
) -> Result<Json<Setting>, ApiError> {
  let store = state.backend.get()?;
  let setting = store
    .put_setting(key, value)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(setting))
}

/// `GET /team`
pub async fn team<S: StoreBackend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<TeamMember>>, ApiError> {
  let Some(store) = state.backend.store() else { return Ok(Json(Vec::new())) };
  let team = store
    .list_team()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(team))
}

/// `GET /stats`
pub async fn stats<S: StoreBackend>(State(state): State<AppState<S>>) -> Json<DashboardStats> {
  Json(state.orders.dashboard_stats().await.or_degraded("dashboard stats"))
}

/// `GET /config`
pub async fn store_config<S: StoreBackend>(State(state): State<AppState<S>>) -> Json<StoreConfig> {
  Json(state.config.store.clone())
}
