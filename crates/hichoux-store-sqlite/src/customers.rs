//! Customers, upserted by phone.

use chrono::Utc;
use hichoux_core::{
  customer::{Customer, CustomerUpsert},
  store::{ChangeKind, CustomerRepository, Resource},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{CUSTOMER_COLUMNS, RawCustomer, encode_dt, encode_uuid},
};

impl CustomerRepository for SqliteStore {
  async fn upsert_customer(&self, input: CustomerUpsert) -> Result<Customer> {
    let new_id = encode_uuid(Uuid::new_v4());
    let now = encode_dt(Utc::now());
    let phone = input.phone.clone();

    // Last write wins on every field except the id and creation time.
    let (raw, inserted): (Option<RawCustomer>, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existed: bool = tx
          .query_row("SELECT 1 FROM customers WHERE phone = ?1", [&input.phone], |_| Ok(true))
          .optional()?
          .unwrap_or(false);

        tx.execute(
          "INSERT INTO customers (id, phone, name, email, address, city, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
           ON CONFLICT(phone) DO UPDATE SET
             name       = excluded.name,
             email      = excluded.email,
             address    = excluded.address,
             city       = excluded.city,
             updated_at = excluded.updated_at",
          rusqlite::params![
            new_id,
            input.phone,
            input.name,
            input.email,
            input.address,
            input.city,
            now,
          ],
        )?;

        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1");
        let raw = tx.query_row(&sql, [&input.phone], RawCustomer::from_row).optional()?;
        tx.commit()?;
        Ok((raw, !existed))
      })
      .await?;

    let customer = raw
      .ok_or_else(|| Error::InvalidValue(format!("customer {phone} vanished after upsert")))?
      .into_customer()?;
    let kind = if inserted { ChangeKind::Insert } else { ChangeKind::Update };
    self.notify(Resource::Customers, kind, encode_uuid(customer.id));
    Ok(customer)
  }

  async fn customer_by_phone(&self, phone: &str) -> Result<Option<Customer>> {
    let phone = phone.to_owned();
    let raw: Option<RawCustomer> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1");
        Ok(conn.query_row(&sql, [&phone], RawCustomer::from_row).optional()?)
      })
      .await?;
    raw.map(RawCustomer::into_customer).transpose()
  }

  async fn list_customers(&self) -> Result<Vec<Customer>> {
    let raws: Vec<RawCustomer> = self
      .conn
      .call(|conn| {
        let sql =
          format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY updated_at DESC, rowid DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawCustomer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCustomer::into_customer).collect()
  }
}
