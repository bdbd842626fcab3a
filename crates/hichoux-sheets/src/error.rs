//! Error types for `hichoux-sheets`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("order reference is required")]
  MissingReference,

  #[error("Unknown action")]
  UnknownAction,

  #[error("Invalid orders array")]
  InvalidOrders,

  #[error("invalid request: {0}")]
  BadRequest(String),

  /// Replies use this exact text.
  #[error("Order not found")]
  OrderNotFound(String),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The mirror answered `success: false`.
  #[error("mirror rejected the request: {0}")]
  Rejected(String),

  #[error("sheet lock poisoned")]
  Poisoned,

  #[error("sheet task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
