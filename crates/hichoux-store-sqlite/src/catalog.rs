//! Products and categories.

use chrono::Utc;
use hichoux_core::{
  catalog::{Category, NewCategory, NewProduct, Product, ProductUpdate},
  store::{CatalogRepository, ChangeKind, ProductQuery, Resource},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    CATEGORY_COLUMNS, PRODUCT_COLUMNS, RawCategory, RawProduct, encode_dt, encode_money,
    encode_uuid,
  },
};

impl SqliteStore {
  async fn product_where(&self, clause: &'static str, param: String) -> Result<Option<Product>> {
    let raw: Option<RawProduct> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PRODUCT_COLUMNS}
           FROM products p LEFT JOIN categories c ON c.id = p.category_id
           WHERE {clause}"
        );
        Ok(conn.query_row(&sql, rusqlite::params![param], RawProduct::from_row).optional()?)
      })
      .await?;
    raw.map(RawProduct::into_product).transpose()
  }
}

impl CatalogRepository for SqliteStore {
  async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
    let featured = query.featured;
    let category = query.category.clone();
    let limit = query.limit.map_or(-1, |l| l as i64);

    let raws: Vec<RawProduct> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PRODUCT_COLUMNS}
           FROM products p LEFT JOIN categories c ON c.id = p.category_id
           WHERE p.is_active = 1
             AND (?1 = 0 OR p.is_featured = 1)
             AND (?2 IS NULL OR c.slug = ?2)
           ORDER BY p.created_at DESC, p.rowid DESC
           LIMIT ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![featured, category, limit], RawProduct::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  async fn product(&self, id: Uuid) -> Result<Option<Product>> {
    self.product_where("p.id = ?1", encode_uuid(id)).await
  }

  async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
    self.product_where("p.slug = ?1 AND p.is_active = 1", slug.to_owned()).await
  }

  async fn add_product(&self, input: NewProduct) -> Result<Product> {
    let id = Uuid::new_v4();
    let id_str = encode_uuid(id);
    let category_id = input.category_id.map(encode_uuid);
    let price = encode_money(input.price);
    let compare_price = input.compare_price.map(encode_money);
    let images = serde_json::to_string(&input.images)?;
    let created_at = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO products (
             id, sku, name, slug, description, price, compare_price, stock,
             category_id, is_featured, is_active, images, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?12)",
          rusqlite::params![
            id_str,
            input.sku,
            input.name,
            input.slug,
            input.description,
            price,
            compare_price,
            input.stock,
            category_id,
            input.is_featured,
            images,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.notify(Resource::Products, ChangeKind::Insert, encode_uuid(id));
    self
      .product(id)
      .await?
      .ok_or_else(|| Error::InvalidValue(format!("product {id} vanished after insert")))
  }

  async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Option<Product>> {
    let id_str = encode_uuid(id);
    let price = update.price.map(encode_money);
    let compare_price = update.compare_price.map(encode_money);
    let images = update.images.as_ref().map(serde_json::to_string).transpose()?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE products SET
             name          = COALESCE(?2, name),
             description   = COALESCE(?3, description),
             price         = COALESCE(?4, price),
             compare_price = COALESCE(?5, compare_price),
             stock         = COALESCE(?6, stock),
             is_featured   = COALESCE(?7, is_featured),
             images        = COALESCE(?8, images)
           WHERE id = ?1",
          rusqlite::params![
            id_str,
            update.name,
            update.description,
            price,
            compare_price,
            update.stock,
            update.is_featured,
            images,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.notify(Resource::Products, ChangeKind::Update, encode_uuid(id));
    self.product(id).await
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {CATEGORY_COLUMNS} FROM categories
           WHERE is_active = 1 ORDER BY sort_order, name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawCategory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn add_category(&self, input: NewCategory) -> Result<Category> {
    let category = Category {
      id:         Uuid::new_v4(),
      name:       input.name,
      slug:       input.slug,
      sort_order: input.sort_order,
      is_active:  true,
    };

    let id_str = encode_uuid(category.id);
    let name = category.name.clone();
    let slug = category.slug.clone();
    let sort_order = category.sort_order;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (id, name, slug, sort_order, is_active)
           VALUES (?1, ?2, ?3, ?4, 1)",
          rusqlite::params![id_str, name, slug, sort_order],
        )?;
        Ok(())
      })
      .await?;

    self.notify(Resource::Categories, ChangeKind::Insert, encode_uuid(category.id));
    Ok(category)
  }
}
