//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The server runs without a backend.
  #[error("backend not connected")]
  Unavailable,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<hichoux_core::Error> for ApiError {
  fn from(e: hichoux_core::Error) -> Self {
    use hichoux_core::Error as E;
    match e {
      E::NotConnected => Self::Unavailable,
      E::NotFound(what) => Self::NotFound(what),
      e @ (E::Validation(_) | E::InvalidTransition { .. } | E::UnknownStatus(_)) => {
        Self::BadRequest(e.to_string())
      }
      E::Persistence(e) => Self::Store(e),
      e => Self::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use hichoux_core::order::OrderStatus;

  use super::*;

  #[test]
  fn core_errors_map_to_status_codes() {
    let cases = [
      (hichoux_core::Error::NotConnected, StatusCode::SERVICE_UNAVAILABLE),
      (hichoux_core::Error::NotFound("order".into()), StatusCode::NOT_FOUND),
      (hichoux_core::Error::Validation("phone".into()), StatusCode::BAD_REQUEST),
      (
        hichoux_core::Error::InvalidTransition {
          from: OrderStatus::Delivered,
          to:   OrderStatus::New,
        },
        StatusCode::BAD_REQUEST,
      ),
      (
        hichoux_core::Error::persistence(std::io::Error::other("disk")),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }
}
