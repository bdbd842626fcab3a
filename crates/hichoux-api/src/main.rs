//! hichoux-api server binary.
//!
//! Reads `storefront.toml` (or the path specified with `--config`), opens the
//! SQLite store when `store_path` is set, and serves the storefront API over
//! HTTP. Without a store the server runs on demo data.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use hichoux_api::{AppState, ServerConfig, sync};
use hichoux_core::{Backend, store::ChangeFeed as _};
use hichoux_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hichoux storefront API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "storefront.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("HICHOUX")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open the store, or run on demo data.
  let backend = match &server_cfg.store_path {
    Some(path) => {
      let path = expand_tilde(path);
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      Backend::connected(store)
    }
    None => {
      tracing::warn!("no store_path configured; serving demo data");
      Backend::Demo
    }
  };

  let watch = match backend.store() {
    Some(store) if server_cfg.store.features.realtime_updates => {
      Some((store.clone(), sync::watch_orders(store.as_ref())))
    }
    _ => None,
  };

  let state = AppState::new(backend, server_cfg.clone());
  let app = hichoux_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  if let Some((store, subscription)) = watch {
    store.unsubscribe(subscription);
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
