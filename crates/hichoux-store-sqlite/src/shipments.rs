//! Shipments and shipping labels.

use chrono::{SubsecRound as _, Utc};
use hichoux_core::{
  shipment::{
    NewShipment, NewShippingLabel, Shipment, ShipmentUpdate, ShippingLabel, ShippingLabelItem,
  },
  store::{ChangeKind, Resource, ShipmentRepository},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    LABEL_COLUMNS, RawLabel, RawShipment, SHIPMENT_COLUMNS, decode_label_item, encode_dt,
    encode_uuid,
  },
};

impl SqliteStore {
  async fn shipment(&self, id: Uuid) -> Result<Option<Shipment>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawShipment> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = ?1");
        Ok(conn.query_row(&sql, [&id_str], RawShipment::from_row).optional()?)
      })
      .await?;
    raw.map(RawShipment::into_shipment).transpose()
  }
}

impl ShipmentRepository for SqliteStore {
  async fn create_shipment(&self, input: NewShipment) -> Result<Shipment> {
    let now = Utc::now().trunc_subsecs(6);
    let shipment = Shipment {
      id:              Uuid::new_v4(),
      order_id:        input.order_id,
      carrier:         input.carrier,
      tracking_number: input.tracking_number,
      status:          input.status,
      created_at:      now,
      updated_at:      now,
    };

    let row = shipment.clone();
    self
      .conn
      .call(move |conn| {
        let at = encode_dt(row.created_at);
        conn.execute(
          "INSERT INTO shipments (
             id, order_id, carrier, tracking_number, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![
            encode_uuid(row.id),
            encode_uuid(row.order_id),
            row.carrier,
            row.tracking_number,
            row.status.as_str(),
            at,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.notify(Resource::Shipments, ChangeKind::Insert, encode_uuid(shipment.id));
    Ok(shipment)
  }

  async fn update_shipment(&self, id: Uuid, update: ShipmentUpdate) -> Result<Option<Shipment>> {
    let id_str = encode_uuid(id);
    let now = encode_dt(Utc::now());
    let status = update.status.map(|s| s.as_str());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE shipments SET
             carrier         = COALESCE(?2, carrier),
             tracking_number = COALESCE(?3, tracking_number),
             status          = COALESCE(?4, status),
             updated_at      = ?5
           WHERE id = ?1",
          rusqlite::params![id_str, update.carrier, update.tracking_number, status, now],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.notify(Resource::Shipments, ChangeKind::Update, encode_uuid(id));
    self.shipment(id).await
  }

  async fn shipments_for_order(&self, order_id: Uuid) -> Result<Vec<Shipment>> {
    let id_str = encode_uuid(order_id);
    let raws: Vec<RawShipment> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {SHIPMENT_COLUMNS} FROM shipments
           WHERE order_id = ?1 ORDER BY created_at, rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([&id_str], RawShipment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawShipment::into_shipment).collect()
  }

  async fn create_label(
    &self,
    input: NewShippingLabel,
    order_ids: Vec<Uuid>,
  ) -> Result<(ShippingLabel, Vec<ShippingLabelItem>)> {
    let label = ShippingLabel {
      id:           Uuid::new_v4(),
      label_number: input.label_number,
      carrier:      input.carrier,
      note:         input.note,
      created_at:   Utc::now().trunc_subsecs(6),
    };
    let items: Vec<ShippingLabelItem> = order_ids
      .into_iter()
      .map(|order_id| ShippingLabelItem { id: Uuid::new_v4(), label_id: label.id, order_id })
      .collect();

    let (row, item_rows) = (label.clone(), items.clone());
    self
      .conn
      .call(move |conn| {
        let label_id = encode_uuid(row.id);
        // Foreign keys reject unknown orders; dropping the transaction
        // without commit rolls the label back with them.
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO shipping_labels (id, label_number, carrier, note, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            label_id,
            row.label_number,
            row.carrier,
            row.note,
            encode_dt(row.created_at),
          ],
        )?;
        for item in &item_rows {
          tx.execute(
            "INSERT INTO shipping_label_items (id, label_id, order_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![encode_uuid(item.id), label_id, encode_uuid(item.order_id)],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    self.notify(Resource::ShippingLabels, ChangeKind::Insert, encode_uuid(label.id));
    for item in &items {
      self.notify(Resource::ShippingLabelItems, ChangeKind::Insert, encode_uuid(item.id));
    }
    Ok((label, items))
  }

  async fn list_labels(&self) -> Result<Vec<ShippingLabel>> {
    let raws: Vec<RawLabel> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {LABEL_COLUMNS} FROM shipping_labels ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawLabel::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawLabel::into_label).collect()
  }

  async fn label_items(&self, label_id: Uuid) -> Result<Vec<ShippingLabelItem>> {
    let id_str = encode_uuid(label_id);
    let rows: Vec<(String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, label_id, order_id FROM shipping_label_items
           WHERE label_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([&id_str], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    rows.into_iter().map(decode_label_item).collect()
  }
}
