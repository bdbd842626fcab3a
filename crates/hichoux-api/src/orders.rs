//! Handlers for `/orders` and `/track`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use hichoux_core::{
  cart::CartLine,
  lifecycle::Submission,
  order::{CustomerForm, Order, OrderDetails, OrderQuery, OrderStatus, TrackingProgress},
  store::StoreBackend,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, sync};

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
  pub lines:    Vec<CartLine>,
  pub customer: CustomerForm,
}

/// `POST /orders`; returns 201 + the [`Submission`].
pub async fn create<S: StoreBackend + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<CheckoutBody>,
) -> Result<impl IntoResponse, ApiError> {
  let submission: Submission = state.orders.submit(&body.lines, &body.customer).await?;
  if let (Some(mirror), Some(details)) = (&state.mirror, &submission.details) {
    sync::push_order(mirror, &details.order, &details.items);
  }
  Ok((StatusCode::CREATED, Json(submission)))
}

// ─── List / get one ───────────────────────────────────────────────────────────

/// `GET /orders[?status=<status>][&limit=<n>]`
pub async fn list<S: StoreBackend>(
  State(state): State<AppState<S>>,
  Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
  Ok(Json(state.orders.list_orders(&query).await?))
}

/// `GET /orders/{id}`
pub async fn get_one<S: StoreBackend>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<OrderDetails>, ApiError> {
  state
    .orders
    .order(id)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("order {id}")))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  /// Parsed by hand so an unknown status is a 400 with a readable message.
  pub status: String,
  #[serde(default)]
  pub note:   String,
  #[serde(default)]
  pub actor:  String,
}

/// `POST /orders/{id}/status`, body: `{"status":"confirmed","note":"...","actor":"..."}`
pub async fn update_status<S: StoreBackend + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Order>, ApiError> {
  let status = OrderStatus::parse(&body.status)?;
  let order = state.orders.update_status(id, status, &body.note, &body.actor).await?;
  if let Some(mirror) = &state.mirror {
    sync::push_status(mirror, &order);
  }
  Ok(Json(order))
}

// ─── Track ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TrackParams {
  #[serde(default)]
  pub q: String,
}

/// Result of a tracking lookup. `found: false` means no order matched; a
/// failed search is an error response instead.
#[derive(Debug, Serialize)]
pub struct TrackReply {
  pub found:        bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub order:        Option<OrderDetails>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub progress:     Option<TrackingProgress>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tracking_url: Option<String>,
}

/// `GET /track?q=<order number or phone>`
pub async fn track<S: StoreBackend>(
  State(state): State<AppState<S>>,
  Query(params): Query<TrackParams>,
) -> Result<Json<TrackReply>, ApiError> {
  let reply = match state.orders.track(&params.q).await? {
    Some(details) => TrackReply {
      found:        true,
      progress:     Some(state.orders.tracking_progress(details.order.status)),
      tracking_url: state.orders.tracking_link(&details),
      order:        Some(details),
    },
    None => TrackReply { found: false, order: None, progress: None, tracking_url: None },
  };
  Ok(Json(reply))
}
