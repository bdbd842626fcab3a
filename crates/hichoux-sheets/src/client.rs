//! Storefront-side client for the mirror endpoint.

use reqwest::Client;

use crate::{
  Error, Result,
  envelope::{Action, Health, Reply},
  record::MirrorOrder,
  sheet::{AddOutcome, BatchReport},
};

/// Posts envelopes to a mirror at a fixed URL.
#[derive(Debug, Clone)]
pub struct MirrorClient {
  http: Client,
  url:  String,
}

impl MirrorClient {
  pub fn new(url: impl Into<String>) -> Self { Self { http: Client::new(), url: url.into() } }

  pub fn url(&self) -> &str { &self.url }

  async fn send(&self, action: &Action) -> Result<Reply> {
    let reply = self
      .http
      .post(&self.url)
      .json(action)
      .send()
      .await?
      .error_for_status()?
      .json::<Reply>()
      .await?;
    Ok(reply)
  }

  /// Append one order. A reference already on the sheet is a skip, not an
  /// error.
  pub async fn add_order(&self, order: MirrorOrder) -> Result<AddOutcome> {
    let order_ref = order.order_ref.clone();
    let reply = self.send(&Action::AddOrder { order }).await?;
    if reply.success {
      return Ok(AddOutcome::Added { row: reply.row.unwrap_or_default() });
    }
    match reply.error {
      Some(e) if e == crate::sheet::ALREADY_EXISTS => {
        tracing::debug!(%order_ref, "mirror already has order");
        Ok(AddOutcome::Skipped)
      }
      e => Err(Error::Rejected(e.unwrap_or_default())),
    }
  }

  pub async fn add_orders(&self, orders: Vec<MirrorOrder>) -> Result<BatchReport> {
    let reply = self.send(&Action::AddOrders { orders }).await?;
    if !reply.success {
      return Err(Error::Rejected(reply.error.unwrap_or_default()));
    }
    Ok(BatchReport {
      total:   reply.total.unwrap_or_default(),
      added:   reply.added.unwrap_or_default(),
      skipped: reply.skipped.unwrap_or_default(),
      failed:  reply.failed.unwrap_or_default(),
      errors:  reply.errors.unwrap_or_default(),
    })
  }

  pub async fn update_status(
    &self,
    order_ref: &str,
    status: Option<&str>,
    tracking: Option<&str>,
  ) -> Result<()> {
    let action = Action::UpdateStatus {
      order_ref: order_ref.to_owned(),
      status:    status.map(str::to_owned),
      tracking:  tracking.map(str::to_owned),
    };
    let reply = self.send(&action).await?;
    if reply.success {
      Ok(())
    } else if reply.error.as_deref() == Some("Order not found") {
      Err(Error::OrderNotFound(order_ref.to_owned()))
    } else {
      Err(Error::Rejected(reply.error.unwrap_or_default()))
    }
  }

  pub async fn get_orders(&self, status: Option<&str>) -> Result<Vec<MirrorOrder>> {
    let reply = self.send(&Action::GetOrders { status: status.map(str::to_owned) }).await?;
    if !reply.success {
      return Err(Error::Rejected(reply.error.unwrap_or_default()));
    }
    Ok(reply.orders.unwrap_or_default())
  }

  pub async fn health(&self) -> Result<Health> {
    Ok(self.http.get(&self.url).send().await?.error_for_status()?.json().await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{OrderSheet, SheetState, router};

  /// Serve a fresh in-memory sheet on an ephemeral port.
  async fn serve() -> MirrorClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(SheetState::new(OrderSheet::new()));
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    MirrorClient::new(format!("http://{addr}/"))
  }

  #[tokio::test]
  async fn second_add_of_a_reference_is_skipped() {
    let mirror = serve().await;

    let first = mirror.add_order(MirrorOrder::new("HCX00000001")).await.unwrap();
    assert_eq!(first, AddOutcome::Added { row: 2 });

    let second = mirror.add_order(MirrorOrder::new("HCX00000001")).await.unwrap();
    assert_eq!(second, AddOutcome::Skipped);

    assert_eq!(mirror.get_orders(None).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn status_of_unknown_reference_is_not_found() {
    let mirror = serve().await;
    let err = mirror.update_status("HCX404", Some("Shipped"), None).await.unwrap_err();
    assert!(matches!(err, Error::OrderNotFound(r) if r == "HCX404"));

    mirror.add_order(MirrorOrder::new("HCX1")).await.unwrap();
    mirror.update_status("HCX1", Some("Shipped"), Some("OZ1")).await.unwrap();
    let shipped = mirror.get_orders(Some("Shipped")).await.unwrap();
    assert_eq!(shipped[0].tracking, "OZ1");
  }

  #[tokio::test]
  async fn batch_report_and_health_round_trip() {
    let mirror = serve().await;
    mirror.add_order(MirrorOrder::new("HCX1")).await.unwrap();

    let report = mirror
      .add_orders(vec![MirrorOrder::new("HCX1"), MirrorOrder::new("HCX2"), MirrorOrder::new("")])
      .await
      .unwrap();
    assert_eq!((report.total, report.added, report.skipped, report.failed), (3, 1, 1, 1));
    assert_eq!(report.errors.len(), 1);

    assert_eq!(mirror.health().await.unwrap().status, "ok");
  }
}
