//! Handlers for shipments and shipping labels.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hichoux_core::{
  shipment::{LabelDetails, NewShipment, NewShippingLabel, Shipment, ShipmentUpdate},
  store::StoreBackend,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `POST /shipments`; returns 201 + the stored [`Shipment`].
pub async fn create<S: StoreBackend>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewShipment>,
) -> Result<impl IntoResponse, ApiError> {
  let shipment = state.shipping.create_shipment(body).await?;
  Ok((StatusCode::CREATED, Json(shipment)))
}

/// `PATCH /shipments/{id}`
pub async fn update<S: StoreBackend>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ShipmentUpdate>,
) -> Result<Json<Shipment>, ApiError> {
  if body.is_empty() {
    return Err(ApiError::BadRequest("nothing to update".into()));
  }
  Ok(Json(state.shipping.update_shipment(id, body).await?))
}

/// `GET /shipping-labels`
pub async fn labels<S: StoreBackend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<LabelDetails>>, ApiError> {
  Ok(Json(state.shipping.shipping_labels().await?))
}

#[derive(Debug, Deserialize)]
pub struct LabelBody {
  #[serde(flatten)]
  pub label:     NewShippingLabel,
  pub order_ids: Vec<Uuid>,
}

/// `POST /shipping-labels`; returns 201 + the label with its orders.
pub async fn create_label<S: StoreBackend>(
  State(state): State<AppState<S>>,
  Json(body): Json<LabelBody>,
) -> Result<impl IntoResponse, ApiError> {
  let details = state.shipping.create_shipping_label(body.label, body.order_ids).await?;
  Ok((StatusCode::CREATED, Json(details)))
}
