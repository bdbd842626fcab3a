//! [`SqliteStore`]: the SQLite implementation of every repository trait.

use std::path::Path;

use chrono::Utc;
use hichoux_core::store::{ChangeEvent, ChangeKind, Repository, Resource};
use tokio::sync::broadcast;

use crate::{Error, Result, schema::SCHEMA};

/// Buffered change events per subscriber before it starts lagging.
const FEED_CAPACITY: usize = 256;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A storefront store backed by a single SQLite file.
///
/// Cloning is cheap: the connection and the change feed are shared.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  pub(crate) feed: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    let (feed, _) = broadcast::channel(FEED_CAPACITY);
    Ok(Self { conn, feed })
  }

  /// Publish a committed change. Having no subscribers is not an error.
  pub(crate) fn notify(&self, resource: Resource, kind: ChangeKind, id: impl Into<String>) {
    let event = ChangeEvent { resource, kind, id: id.into(), at: Utc::now() };
    let _ = self.feed.send(event);
  }
}

impl Repository for SqliteStore {
  type Error = Error;
}
