//! Orders, their items and their status history.

use chrono::{SubsecRound as _, Utc};
use hichoux_core::{
  order::{
    NewOrder, Order, OrderHistoryEntry, OrderItem, OrderQuery, OrderStatus, StatusPatch,
    sequential_order_number,
  },
  store::{ChangeKind, OrderRepository, Resource},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    HISTORY_COLUMNS, ITEM_COLUMNS, ORDER_COLUMNS, RawHistoryEntry, RawOrder, RawOrderItem,
    encode_dt, encode_money, encode_payment_method, encode_source, encode_uuid,
  },
};

impl SqliteStore {
  async fn order_where(&self, clause: &'static str, param: String) -> Result<Option<Order>> {
    let raw: Option<RawOrder> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE {clause}");
        Ok(conn.query_row(&sql, rusqlite::params![param], RawOrder::from_row).optional()?)
      })
      .await?;
    raw.map(RawOrder::into_order).transpose()
  }

  async fn orders_where(
    &self,
    clause: &'static str,
    param: Option<String>,
    limit: Option<usize>,
  ) -> Result<Vec<Order>> {
    let limit = limit.map_or(-1, |l| l as i64);
    let raws: Vec<RawOrder> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ORDER_COLUMNS} FROM orders
           WHERE {clause}
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![param, limit], RawOrder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawOrder::into_order).collect()
  }
}

/// Insert one history row inside an open transaction.
fn insert_history(
  tx: &rusqlite::Transaction<'_>,
  order_id: &str,
  status: OrderStatus,
  note: &str,
  actor: &str,
  at: &str,
) -> rusqlite::Result<()> {
  tx.execute(
    "INSERT INTO order_history (id, order_id, status, note, changed_by_name, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![encode_uuid(Uuid::new_v4()), order_id, status.as_str(), note, actor, at],
  )?;
  Ok(())
}

impl OrderRepository for SqliteStore {
  async fn create_order(&self, input: NewOrder) -> Result<(Order, Vec<OrderItem>)> {
    let order_id = Uuid::new_v4();
    // Stored timestamps carry microseconds; truncate so the returned order
    // equals what a later read decodes.
    let now = Utc::now().trunc_subsecs(6);

    let items: Vec<OrderItem> = input
      .items
      .into_iter()
      .map(|i| OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: i.product_id,
        product_sku: i.product_sku,
        product_name: i.product_name,
        unit_price: i.unit_price,
        quantity: i.quantity,
        total_price: i.total_price,
      })
      .collect();

    let mut order = Order {
      id:               order_id,
      order_number:     String::new(),
      customer_id:      input.customer_id,
      customer_name:    input.customer_name,
      customer_phone:   input.customer_phone,
      customer_email:   input.customer_email,
      shipping_address: input.shipping_address,
      shipping_city:    input.shipping_city,
      notes:            input.notes,
      subtotal:         input.subtotal,
      shipping_cost:    input.shipping_cost,
      total:            input.total,
      status:           OrderStatus::New,
      payment_method:   input.payment_method,
      source:           input.source,
      created_at:       now,
      confirmed_at:     None,
      confirmed_by:     None,
      shipped_at:       None,
      delivered_at:     None,
      cancelled_at:     None,
      cancelled_reason: None,
    };

    let row = order.clone();
    let item_rows = items.clone();
    let (created_note, created_by) = (input.created_note, input.created_by);

    let order_number: String = self
      .conn
      .call(move |conn| {
        let id_str = encode_uuid(row.id);
        let at_str = encode_dt(row.created_at);
        let tx = conn.transaction()?;

        let seq: i64 =
          tx.query_row("SELECT COALESCE(MAX(rowid), 0) + 1 FROM orders", [], |r| r.get(0))?;
        let order_number = sequential_order_number(seq.unsigned_abs());

        tx.execute(
          "INSERT INTO orders (
             id, order_number, customer_id, customer_name, customer_phone, customer_email,
             shipping_address, shipping_city, notes, subtotal, shipping_cost, total,
             status, payment_method, source, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
          rusqlite::params![
            id_str,
            order_number,
            row.customer_id.map(encode_uuid),
            row.customer_name,
            row.customer_phone,
            row.customer_email,
            row.shipping_address,
            row.shipping_city,
            row.notes,
            encode_money(row.subtotal),
            encode_money(row.shipping_cost),
            encode_money(row.total),
            OrderStatus::New.as_str(),
            encode_payment_method(row.payment_method),
            encode_source(row.source),
            at_str,
          ],
        )?;

        for item in &item_rows {
          tx.execute(
            "INSERT INTO order_items (
               id, order_id, product_id, product_sku, product_name,
               unit_price, quantity, total_price
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
              encode_uuid(item.id),
              id_str,
              item.product_id.map(encode_uuid),
              item.product_sku,
              item.product_name,
              encode_money(item.unit_price),
              item.quantity,
              encode_money(item.total_price),
            ],
          )?;
        }

        insert_history(&tx, &id_str, OrderStatus::New, &created_note, &created_by, &at_str)?;

        tx.commit()?;
        Ok(order_number)
      })
      .await?;

    self.notify(Resource::Orders, ChangeKind::Insert, encode_uuid(order_id));
    for item in &items {
      self.notify(Resource::OrderItems, ChangeKind::Insert, encode_uuid(item.id));
    }
    self.notify(Resource::OrderHistory, ChangeKind::Insert, encode_uuid(order_id));
    order.order_number = order_number;
    Ok((order, items))
  }

  async fn order(&self, id: Uuid) -> Result<Option<Order>> {
    self.order_where("id = ?1", encode_uuid(id)).await
  }

  async fn order_by_number(&self, number: &str) -> Result<Option<Order>> {
    self.order_where("order_number = ?1", number.to_owned()).await
  }

  async fn orders_by_phone(&self, phone: &str) -> Result<Vec<Order>> {
    self.orders_where("customer_phone = ?1", Some(phone.to_owned()), None).await
  }

  async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
    let status = query.status.map(|s| s.as_str().to_owned());
    self.orders_where("(?1 IS NULL OR status = ?1)", status, query.limit).await
  }

  async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let id_str = encode_uuid(order_id);
    let raws: Vec<RawOrderItem> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawOrderItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawOrderItem::into_item).collect()
  }

  async fn order_history(&self, order_id: Uuid) -> Result<Vec<OrderHistoryEntry>> {
    let id_str = encode_uuid(order_id);
    let raws: Vec<RawHistoryEntry> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {HISTORY_COLUMNS} FROM order_history
           WHERE order_id = ?1 ORDER BY created_at, rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawHistoryEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawHistoryEntry::into_entry).collect()
  }

  async fn apply_status(&self, order_id: Uuid, patch: StatusPatch) -> Result<Option<Order>> {
    let id_str = encode_uuid(order_id);
    let at_str = encode_dt(patch.at);

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Each status owns its stamp columns; every other stamp keeps its
        // current value.
        let changed = tx.execute(
          "UPDATE orders SET
             status           = ?2,
             confirmed_at     = CASE WHEN ?2 = 'confirmed' THEN ?3 ELSE confirmed_at END,
             confirmed_by     = CASE WHEN ?2 = 'confirmed' THEN ?4 ELSE confirmed_by END,
             shipped_at       = CASE WHEN ?2 = 'shipped'   THEN ?3 ELSE shipped_at END,
             delivered_at     = CASE WHEN ?2 = 'delivered' THEN ?3 ELSE delivered_at END,
             cancelled_at     = CASE WHEN ?2 = 'cancelled' THEN ?3 ELSE cancelled_at END,
             cancelled_reason = CASE WHEN ?2 = 'cancelled' THEN ?5 ELSE cancelled_reason END
           WHERE id = ?1",
          rusqlite::params![
            id_str,
            patch.status.as_str(),
            at_str,
            patch.confirmed_by,
            patch.cancelled_reason,
          ],
        )?;

        if changed == 0 {
          return Ok(false);
        }
        insert_history(&tx, &id_str, patch.status, &patch.note, &patch.actor, &at_str)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !changed {
      return Ok(None);
    }
    self.notify(Resource::Orders, ChangeKind::Update, encode_uuid(order_id));
    self.notify(Resource::OrderHistory, ChangeKind::Insert, encode_uuid(order_id));
    self.order(order_id).await
  }
}
