//! Error types for `hichoux-core`.

use thiserror::Error;

use crate::order::OrderStatus;

#[derive(Debug, Error)]
pub enum Error {
  /// No backend is configured; the storefront runs on demo data.
  #[error("backend not connected")]
  NotConnected,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("cannot move an order from {from} to {to}")]
  InvalidTransition { from: OrderStatus, to: OrderStatus },

  #[error("unknown order status: {0:?}")]
  UnknownStatus(String),

  /// A write or read rejected by the repository backend.
  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The client-side cart storage could not be read or written.
  #[error("cart storage error: {0}")]
  Storage(String),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend error. This is the only place backend errors are
  /// classified.
  pub fn persistence<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }

  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }

  pub fn is_not_connected(&self) -> bool { matches!(self, Self::NotConnected) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Degrade a failed lookup into an empty value.
///
/// List and lookup operations are allowed to fail quietly: the caller gets
/// `T::default()` and the failure is logged.
pub trait ResultExt<T> {
  fn or_degraded(self, what: &str) -> T;
}

impl<T: Default> ResultExt<T> for Result<T> {
  fn or_degraded(self, what: &str) -> T {
    match self {
      Ok(value) => value,
      Err(Error::NotConnected) => {
        tracing::debug!(what, "backend not connected; using empty result");
        T::default()
      }
      Err(err) => {
        tracing::warn!(what, error = %err, "lookup failed; using empty result");
        T::default()
      }
    }
  }
}
