//! bazaar-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite record store, and serves the analytics API over HTTP.
//!
//! # Loading fixtures
//!
//! To load a JSON bundle of raw records (`{"products": [...], "promotions":
//! [...], "viewSamples": [...]}`) into a store and exit:
//!
//! ```text
//! cargo run -p bazaar-server --bin server -- --import records.json --store-id shop-1
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use bazaar_core::source::SourceRecords;
use bazaar_server::{ServerConfig, app, expand_tilde, load_config};
use bazaar_store_sqlite::SqliteEventStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Bazaar analytics server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Import raw records from a JSON file into the store and exit.
  #[arg(long, requires = "store_id")]
  import: Option<PathBuf>,

  /// Store the imported records belong to.
  #[arg(long)]
  store_id: Option<String>,
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

  let server_cfg: ServerConfig =
    load_config(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteEventStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: import a fixture and exit.
  if let Some(path) = cli.import {
    let store_id = cli
      .store_id
      .context("--store-id is required with --import")?;
    let input = std::fs::read_to_string(&path)
      .with_context(|| format!("failed to read {path:?}"))?;
    let records = SourceRecords::from_json_str(&input)
      .with_context(|| format!("failed to parse {path:?}"))?;
    let count = store
      .import(&store_id, &records)
      .await
      .context("failed to import records")?;
    println!("imported {count} records into {store_id}");
    return Ok(());
  }

  let app = app(Arc::new(store), &server_cfg);
  let address = server_cfg.address();

  tracing::info!(
    store = ?store_path,
    cache_capacity = server_cfg.cache_capacity,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
