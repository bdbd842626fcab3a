//! HTTP surface of the mirror: one envelope endpoint plus a health check.

use std::sync::{Arc, Mutex};

use axum::{Json, Router, body::Bytes, extract::State, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
  Error,
  envelope::{self, Health, Reply},
  sheet::OrderSheet,
};

/// Shared state threaded through the handlers.
#[derive(Clone)]
pub struct SheetState {
  pub sheet: Arc<Mutex<OrderSheet>>,
}

impl SheetState {
  pub fn new(sheet: OrderSheet) -> Self { Self { sheet: Arc::new(Mutex::new(sheet)) } }
}

/// Build the mirror [`Router`].
pub fn router(state: SheetState) -> Router {
  Router::new()
    .route("/", get(health).post(dispatch))
    .with_state(state)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Health> { Json(Health::now()) }

/// Every envelope gets a 200; failures live in the body.
///
/// The sheet is locked and written to disk on the blocking pool.
async fn dispatch(State(state): State<SheetState>, body: Bytes) -> Json<Reply> {
  let sheet = Arc::clone(&state.sheet);
  let reply = tokio::task::spawn_blocking(move || match sheet.lock() {
    Ok(mut sheet) => envelope::handle(&mut sheet, &body),
    Err(_) => Reply::failure(Error::Poisoned.to_string()),
  })
  .await
  .unwrap_or_else(|e| Reply::failure(Error::from(e).to_string()));
  Json(reply)
}
