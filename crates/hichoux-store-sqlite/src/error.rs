//! Error type for `hichoux-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] hichoux_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("invalid column value: {0}")]
  InvalidValue(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
