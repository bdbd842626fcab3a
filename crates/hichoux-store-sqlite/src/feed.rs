//! The realtime change feed.
//!
//! Every committed write is published on a broadcast channel. Each
//! subscription is a task that filters the channel and calls its callback.

use hichoux_core::store::{ChangeEvent, ChangeFeed, ChangeKind, Resource};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};

use crate::SqliteStore;

/// Handle for an active subscription; pass it back to
/// [`ChangeFeed::unsubscribe`] to stop the callback.
#[derive(Debug)]
pub struct Subscription {
  resource: Resource,
  kind:     ChangeKind,
  task:     JoinHandle<()>,
}

impl Subscription {
  pub fn resource(&self) -> Resource { self.resource }

  pub fn kind(&self) -> ChangeKind { self.kind }
}

impl ChangeFeed for SqliteStore {
  type Subscription = Subscription;

  /// Must be called from within a tokio runtime.
  fn subscribe<F>(&self, resource: Resource, kind: ChangeKind, callback: F) -> Subscription
  where
    F: Fn(ChangeEvent) + Send + Sync + 'static,
  {
    let mut rx = self.feed.subscribe();
    let task = tokio::spawn(async move {
      loop {
        match rx.recv().await {
          Ok(event) if event.resource == resource && kind.matches(event.kind) => callback(event),
          Ok(_) => {}
          Err(RecvError::Lagged(missed)) => {
            tracing::warn!(%resource, missed, "change feed subscriber lagged");
          }
          Err(RecvError::Closed) => break,
        }
      }
    });
    tracing::debug!(%resource, %kind, "change feed subscription opened");
    Subscription { resource, kind, task }
  }

  fn unsubscribe(&self, subscription: Subscription) {
    subscription.task.abort();
    tracing::debug!(
      resource = %subscription.resource,
      kind = %subscription.kind,
      "change feed subscription closed"
    );
  }
}
