//! Whether a repository backend is configured at all.

use std::sync::Arc;

use crate::{Error, Result};

/// Either a connected repository or demo mode.
///
/// In demo mode writes fail with [`Error::NotConnected`] and lookups come back
/// empty.
#[derive(Debug)]
pub enum Backend<S> {
  Connected(Arc<S>),
  Demo,
}

impl<S> Backend<S> {
  pub fn connected(store: S) -> Self { Self::Connected(Arc::new(store)) }

  pub fn is_connected(&self) -> bool { matches!(self, Self::Connected(_)) }

  /// The store, or [`Error::NotConnected`].
  pub fn get(&self) -> Result<&S> {
    match self {
      Self::Connected(store) => Ok(store),
      Self::Demo => Err(Error::NotConnected),
    }
  }

  pub fn store(&self) -> Option<&Arc<S>> {
    match self {
      Self::Connected(store) => Some(store),
      Self::Demo => None,
    }
  }
}

impl<S> Clone for Backend<S> {
  fn clone(&self) -> Self {
    match self {
      Self::Connected(store) => Self::Connected(Arc::clone(store)),
      Self::Demo => Self::Demo,
    }
  }
}

impl<S> From<Option<S>> for Backend<S> {
  fn from(store: Option<S>) -> Self { store.map_or(Self::Demo, Self::connected) }
}
