//! Best-effort pushes to the order sheet mirror, and realtime change logging.
//!
//! Pushes run in their own task; a failed push is logged and never reaches
//! the response that triggered it.

use hichoux_core::{
  order::{Order, OrderItem},
  store::{ChangeFeed, ChangeKind, Resource},
};
use hichoux_sheets::{MirrorClient, MirrorOrder, sheet::AddOutcome};

/// Append a newly submitted order to the mirror.
pub fn push_order(mirror: &MirrorClient, order: &Order, items: &[OrderItem]) {
  let row = MirrorOrder::from_details(order, items);
  let mirror = mirror.clone();
  tokio::spawn(async move {
    let order_ref = row.order_ref.clone();
    match mirror.add_order(row).await {
      Ok(AddOutcome::Added { row }) => tracing::debug!(%order_ref, row, "order mirrored"),
      Ok(AddOutcome::Skipped) => tracing::debug!(%order_ref, "order already mirrored"),
      Err(e) => tracing::warn!(%order_ref, error = %e, "failed to mirror order"),
    }
  });
}

/// Mirror a status change onto the sheet row.
pub fn push_status(mirror: &MirrorClient, order: &Order) {
  let order_ref = order.order_number.clone();
  let status = order.status.sheet_label();
  let mirror = mirror.clone();
  tokio::spawn(async move {
    if let Err(e) = mirror.update_status(&order_ref, Some(status), None).await {
      tracing::warn!(%order_ref, error = %e, "failed to mirror status change");
    }
  });
}

/// Log every committed order change until the returned handle is passed to
/// [`ChangeFeed::unsubscribe`].
pub fn watch_orders<F: ChangeFeed>(feed: &F) -> F::Subscription {
  feed.subscribe(Resource::Orders, ChangeKind::All, |event| {
    tracing::info!(id = %event.id, kind = %event.kind, at = %event.at, "order changed");
  })
}
