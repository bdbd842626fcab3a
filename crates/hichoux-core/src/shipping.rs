//! Shipment and shipping-label operations.

use uuid::Uuid;

use crate::{
  Error, Result,
  backend::Backend,
  order::Order,
  shipment::{
    LabelDetails, NewShipment, NewShippingLabel, Shipment, ShipmentUpdate, ShippingLabelItem,
  },
  store::{OrderRepository, ShipmentRepository},
};

pub struct ShipmentTracker<S> {
  backend: Backend<S>,
}

impl<S> Clone for ShipmentTracker<S> {
  fn clone(&self) -> Self { Self { backend: self.backend.clone() } }
}

impl<S> ShipmentTracker<S>
where
  S: OrderRepository + ShipmentRepository,
{
  pub fn new(backend: Backend<S>) -> Self { Self { backend } }

  /// Attach a shipment to an existing order.
  pub async fn create_shipment(&self, input: NewShipment) -> Result<Shipment> {
    let store = self.backend.get()?;
    if input.carrier.trim().is_empty() {
      return Err(Error::Validation("carrier is required".into()));
    }
    store
      .order(input.order_id)
      .await
      .map_err(Error::persistence)?
      .ok_or_else(|| Error::NotFound(format!("order {}", input.order_id)))?;

    let shipment = store.create_shipment(input).await.map_err(Error::persistence)?;
    tracing::info!(
      shipment_id = %shipment.id,
      order_id = %shipment.order_id,
      carrier = %shipment.carrier,
      "shipment created"
    );
    Ok(shipment)
  }

  pub async fn update_shipment(&self, id: Uuid, update: ShipmentUpdate) -> Result<Shipment> {
    let store = self.backend.get()?;
    store
      .update_shipment(id, update)
      .await
      .map_err(Error::persistence)?
      .ok_or_else(|| Error::NotFound(format!("shipment {id}")))
  }

  /// Group orders under one carrier label. Either the label and every item
  /// are written, or nothing is.
  pub async fn create_shipping_label(
    &self,
    input: NewShippingLabel,
    order_ids: Vec<Uuid>,
  ) -> Result<LabelDetails> {
    let store = self.backend.get()?;
    if order_ids.is_empty() {
      return Err(Error::Validation("a shipping label needs at least one order".into()));
    }
    if input.label_number.trim().is_empty() {
      return Err(Error::Validation("label number is required".into()));
    }
    for id in &order_ids {
      if store.order(*id).await.map_err(Error::persistence)?.is_none() {
        return Err(Error::NotFound(format!("order {id}")));
      }
    }

    let (label, items) = store.create_label(input, order_ids).await.map_err(Error::persistence)?;
    tracing::info!(label = %label.label_number, orders = items.len(), "shipping label created");

    let orders = self.orders_of(store, &items).await?;
    Ok(LabelDetails { label, items, orders })
  }

  /// Every label, newest first, with its items and orders.
  pub async fn shipping_labels(&self) -> Result<Vec<LabelDetails>> {
    let Some(store) = self.backend.store() else { return Ok(Vec::new()) };
    let labels = store.list_labels().await.map_err(Error::persistence)?;

    let mut out = Vec::with_capacity(labels.len());
    for label in labels {
      let items = store.label_items(label.id).await.map_err(Error::persistence)?;
      let orders = self.orders_of(store, &items).await?;
      out.push(LabelDetails { label, items, orders });
    }
    Ok(out)
  }

  pub async fn shipments_for_order(&self, order_id: Uuid) -> Result<Vec<Shipment>> {
    let Some(store) = self.backend.store() else { return Ok(Vec::new()) };
    store.shipments_for_order(order_id).await.map_err(Error::persistence)
  }

  async fn orders_of(&self, store: &S, items: &[ShippingLabelItem]) -> Result<Vec<Order>> {
    let mut orders = Vec::with_capacity(items.len());
    for item in items {
      if let Some(order) = store.order(item.order_id).await.map_err(Error::persistence)? {
        orders.push(order);
      }
    }
    Ok(orders)
  }
}
