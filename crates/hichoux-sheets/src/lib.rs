//! The order sheet mirror.
//!
//! A back-office spreadsheet of orders, one row per order reference, kept
//! in sync best-effort by the storefront. Writes are idempotent on the order
//! reference. The sheet is served over a single JSON endpoint that takes an
//! `{action, ...}` envelope (see [`envelope`]), and [`MirrorClient`] speaks
//! that envelope from the storefront side.

pub mod client;
pub mod envelope;
pub mod error;
pub mod record;
pub mod router;
pub mod sheet;

pub use client::MirrorClient;
pub use error::{Error, Result};
pub use record::{MirrorOrder, SheetRow};
pub use router::{SheetState, router};
pub use sheet::OrderSheet;

use std::path::PathBuf;

use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration of the `sheets` binary, deserialised from
/// `sheets.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// JSON file the sheet is persisted to; memory-only when unset.
  #[serde(default)]
  pub sheet_path: Option<PathBuf>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8090 }
