use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use hichoux_core::{
  Backend,
  catalog::{NewCategory, NewProduct},
  store::CatalogRepository as _,
};
use hichoux_store_sqlite::SqliteStore;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, ServerConfig, router};

async fn state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  AppState::new(Backend::connected(store), ServerConfig::default())
}

fn demo_state() -> AppState<SqliteStore> { AppState::new(Backend::Demo, ServerConfig::default()) }

async fn call(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      req = req.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = router(state.clone()).oneshot(req.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

fn checkout(phone: &str) -> Value {
  json!({
    "lines": [
      {"id": "7f9c2ba4-e88f-4f6e-9d7a-2a1c8a3f5e01", "sku": "PARFUM-001",
       "name": "Parfum Oud", "price": 150, "qty": 2, "image": null},
      {"id": "7f9c2ba4-e88f-4f6e-9d7a-2a1c8a3f5e02", "sku": "COSM-001",
       "name": "Crème", "price": 89, "qty": 1, "image": null}
    ],
    "customer": {
      "name": "Amine Benali", "phone": phone, "address": "12 rue Atlas",
      "city": "Rabat", "notes": ""
    }
  })
}

async fn submit(state: &AppState<SqliteStore>, phone: &str) -> Value {
  let (status, body) = call(state, "POST", "/orders", Some(checkout(phone))).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body
}

// ─── Catalog ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn products_by_category_and_slug() {
  let state = state().await;
  let store = state.backend.store().unwrap();
  let category = store
    .add_category(NewCategory { name: "Parfums".into(), slug: "parfums".into(), sort_order: 1 })
    .await
    .unwrap();
  store
    .add_product(NewProduct {
      sku:           "PARFUM-001".into(),
      name:          "Parfum Oud".into(),
      slug:          "parfum-oud".into(),
      description:   String::new(),
      price:         Decimal::from(150),
      compare_price: Some(Decimal::from(200)),
      stock:         4,
      category_id:   Some(category.id),
      is_featured:   true,
      images:        vec![],
    })
    .await
    .unwrap();

  let (status, body) = call(&state, "GET", "/products?category=parfums&featured=true", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);

  let (_, body) = call(&state, "GET", "/products?category=soins", None).await;
  assert!(body.as_array().unwrap().is_empty());

  let (status, body) = call(&state, "GET", "/products/parfum-oud", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["sku"], "PARFUM-001");
  assert_eq!(body["category"]["slug"], "parfums");

  let (status, body) = call(&state, "GET", "/products/missing", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());

  let (_, body) = call(&state, "GET", "/categories", None).await;
  assert_eq!(body[0]["slug"], "parfums");
}

#[tokio::test]
async fn demo_mode_serves_demo_catalog_and_refuses_writes() {
  let state = demo_state();

  let (status, body) = call(&state, "GET", "/products", None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(!body.as_array().unwrap().is_empty());

  let (_, body) = call(&state, "GET", "/orders", None).await;
  assert!(body.as_array().unwrap().is_empty());

  let (status, body) = call(&state, "PUT", "/settings/store_name", Some(json!("Hichoux"))).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(body["error"], "backend not connected");
}

#[tokio::test]
async fn demo_checkout_returns_a_number_without_persisting() {
  let state = demo_state();
  let body = submit(&state, "0612345678").await;
  let number = body["order_number"].as_str().unwrap();
  assert!(number.starts_with("HCX"));
  assert_eq!(number.len(), 11);
  assert!(body["details"].is_null());
}

// ─── Orders ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn checkout_creates_order_with_totals() {
  let state = state().await;
  let body = submit(&state, "0612345678").await;

  assert_eq!(body["order_number"], "HCX00000001");
  assert_eq!(body["totals"]["subtotal"].as_f64(), Some(389.0));
  assert_eq!(body["totals"]["shipping"].as_f64(), Some(30.0));
  assert_eq!(body["totals"]["total"].as_f64(), Some(419.0));

  let id = body["details"]["order"]["id"].as_str().unwrap().to_owned();
  let (status, body) = call(&state, "GET", &format!("/orders/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["items"].as_array().unwrap().len(), 2);
  assert_eq!(body["history"][0]["status"], "new");
  assert_eq!(body["history"][0]["changed_by_name"], "System");
}

#[tokio::test]
async fn rejected_checkouts_are_400() {
  let state = state().await;

  let mut empty = checkout("0612345678");
  empty["lines"] = json!([]);
  let (status, _) = call(&state, "POST", "/orders", Some(empty)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let mut blank = checkout("0612345678");
  blank["customer"]["city"] = json!("  ");
  let (status, _) = call(&state, "POST", "/orders", Some(blank)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let mut negative = checkout("0612345678");
  negative["lines"][1]["price"] = json!(-500);
  let (status, body) = call(&state, "POST", "/orders", Some(negative)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("negative price"), "{body}");

  let (_, body) = call(&state, "GET", "/orders", None).await;
  assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn status_changes_follow_the_transition_rules() {
  let state = state().await;
  let body = submit(&state, "0612345678").await;
  let id = body["details"]["order"]["id"].as_str().unwrap().to_owned();
  let uri = format!("/orders/{id}/status");

  let (status, body) = call(
    &state,
    "POST",
    &uri,
    Some(json!({"status": "confirmed", "note": "Appel OK", "actor": "Sara"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "confirmed");
  assert_eq!(body["confirmed_by"], "Sara");
  assert!(body["confirmed_at"].is_string());

  let (status, _) = call(&state, "POST", &uri, Some(json!({"status": "new"}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(&state, "POST", &uri, Some(json!({"status": "lost"}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = call(&state, "GET", &format!("/orders/{id}"), None).await;
  assert_eq!(body["history"].as_array().unwrap().len(), 2);

  let unknown = format!("/orders/{}/status", uuid::Uuid::new_v4());
  let (status, _) = call(&state, "POST", &unknown, Some(json!({"status": "confirmed"}))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orders_filter_by_status_and_stats_count_delivered_revenue() {
  let state = state().await;
  let first = submit(&state, "0611111111").await;
  submit(&state, "0622222222").await;

  let id = first["details"]["order"]["id"].as_str().unwrap().to_owned();
  call(&state, "POST", &format!("/orders/{id}/status"), Some(json!({"status": "delivered"})))
    .await;

  let (_, body) = call(&state, "GET", "/orders?status=delivered", None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);

  let (_, body) = call(&state, "GET", "/orders?limit=1", None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);

  let (_, body) = call(&state, "GET", "/stats", None).await;
  assert_eq!(body["total_orders"], 2);
  assert_eq!(body["by_status"]["delivered"], 1);
  assert_eq!(body["by_status"]["new"], 1);
  assert_eq!(body["revenue"].as_f64(), Some(419.0));
}

#[tokio::test]
async fn track_by_number_or_phone() {
  let state = state().await;
  submit(&state, "0612345678").await;

  let (status, body) = call(&state, "GET", "/track?q=hcx00000001", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["found"], true);
  assert_eq!(body["progress"]["completed"], 1);

  let (_, body) = call(&state, "GET", "/track?q=0612345678", None).await;
  assert_eq!(body["order"]["order"]["order_number"], "HCX00000001");

  let (_, body) = call(&state, "GET", "/track?q=0699999999", None).await;
  assert_eq!(body["found"], false);

  let (status, _) = call(&state, "GET", "/track?q=", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Shipping ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn shipment_lifecycle_and_tracking_link() {
  let state = state().await;
  let body = submit(&state, "0612345678").await;
  let order_id = body["details"]["order"]["id"].as_str().unwrap().to_owned();

  let (status, shipment) = call(
    &state,
    "POST",
    "/shipments",
    Some(json!({"order_id": order_id, "carrier": "ozone"})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(shipment["status"], "pending");

  let uri = format!("/shipments/{}", shipment["id"].as_str().unwrap());
  let (status, shipment) = call(
    &state,
    "PATCH",
    &uri,
    Some(json!({"tracking_number": "OZ123", "status": "in_transit"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(shipment["tracking_number"], "OZ123");

  let (_, body) = call(&state, "GET", "/track?q=HCX00000001", None).await;
  assert_eq!(body["tracking_url"], "https://client.ozoneexpress.ma/tracking/OZ123");

  let missing = format!("/shipments/{}", uuid::Uuid::new_v4());
  let (status, _) = call(&state, "PATCH", &missing, Some(json!({"carrier": "sendit"}))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn labels_group_orders_and_reject_unknown_ones() {
  let state = state().await;
  let a = submit(&state, "0611111111").await;
  let b = submit(&state, "0622222222").await;
  let ids = [&a, &b].map(|s| s["details"]["order"]["id"].clone());

  let (status, body) = call(
    &state,
    "POST",
    "/shipping-labels",
    Some(json!({"label_number": "LBL-1", "carrier": "digylog", "order_ids": ids})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["items"].as_array().unwrap().len(), 2);
  assert_eq!(body["orders"].as_array().unwrap().len(), 2);

  let (status, _) = call(
    &state,
    "POST",
    "/shipping-labels",
    Some(json!({
      "label_number": "LBL-2", "carrier": "digylog",
      "order_ids": [ids[0], uuid::Uuid::new_v4()]
    })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = call(
    &state,
    "POST",
    "/shipping-labels",
    Some(json!({"label_number": "LBL-3", "carrier": "digylog", "order_ids": []})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = call(&state, "GET", "/shipping-labels", None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["label"]["label_number"], "LBL-1");
}

// ─── Back office ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn checkout_upserts_customer_and_settings_round_trip() {
  let state = state().await;
  submit(&state, "0612345678").await;

  let (_, body) = call(&state, "GET", "/customers", None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["phone"], "0612345678");

  let (status, body) =
    call(&state, "PUT", "/settings/banner", Some(json!({"text": "Livraison offerte"}))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["key"], "banner");

  let (_, body) = call(&state, "GET", "/settings", None).await;
  assert_eq!(body[0]["value"]["text"], "Livraison offerte");

  let (_, body) = call(&state, "GET", "/team", None).await;
  assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn config_exposes_store_tables() {
  let state = state().await;
  let (status, body) = call(&state, "GET", "/config", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["currency"]["label"], "DH");
  assert!(body["carriers"].as_array().unwrap().iter().any(|c| c["id"] == "ozone"));
}
