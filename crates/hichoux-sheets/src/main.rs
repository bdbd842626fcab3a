//! hichoux-sheets server binary.
//!
//! Reads `sheets.toml` (or the path given with `--config`), opens the order
//! sheet, and serves the mirror envelope over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use hichoux_sheets::{OrderSheet, SheetState, SheetsConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hichoux order sheet mirror")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sheets.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HICHOUX_SHEETS"))
    .build()
    .context("failed to read config file")?;

  let cfg: SheetsConfig = settings
    .try_deserialize()
    .context("failed to deserialise SheetsConfig")?;

  let sheet = match &cfg.sheet_path {
    Some(path) => OrderSheet::open(path)
      .with_context(|| format!("failed to open sheet at {path:?}"))?,
    None => {
      tracing::warn!("no sheet_path configured; rows are kept in memory only");
      OrderSheet::new()
    }
  };
  tracing::info!(rows = sheet.len(), "order sheet ready");

  let app = hichoux_sheets::router(SheetState::new(sheet));
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
