//! dossier-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), layers
//! `DOSSIER_*` environment variables on top, opens the SQLite store and the
//! storage backends, and serves HTTP.
//!
//! Nested keys use a double underscore in the environment:
//!
//! ```text
//! DOSSIER_CLASSIFIER__API_KEY=...
//! DOSSIER_STORAGE__S3__BUCKET=...
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use dossier_classify::GeminiClassifier;
use dossier_server::{AppState, ServerConfig};
use dossier_storage::Storage;
use dossier_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Dossier document server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
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
      config::Environment::with_prefix("DOSSIER")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read configuration")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.storage.local.root = expand_tilde(&server_cfg.storage.local.root);

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  let storage = Storage::from_config(&server_cfg.storage)
    .context("failed to initialise storage backends")?;

  if server_cfg.classifier.api_key.is_empty() {
    tracing::warn!("no classifier API key configured; auto-assign uploads will stay unclassified");
  }
  let classifier = GeminiClassifier::new(server_cfg.classifier.clone())
    .context("failed to build classifier client")?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(
    Arc::new(store),
    Arc::new(storage),
    Arc::new(classifier),
    server_cfg,
  );
  let app = dossier_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

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
