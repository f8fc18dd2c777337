//! HTTP surface for Dossier.
//!
//! Serves the retrieval and upload entry points on top of any
//! [`DocumentStore`], and mounts the administrative JSON API from
//! [`dossier_api`] under `/api`.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET  | `/documents/{id}` | [`handlers::download::document`] |
//! | GET  | `/documents/{id}/text` | [`handlers::download::document_text`] |
//! | GET  | `/documents/{id}/access` | [`handlers::download::access`] |
//! | GET  | `/share/{code}` | [`handlers::download::share`] |
//! | GET  | `/share/{code}/text` | [`handlers::download::share_text`] |
//! | GET  | `/file-requests/{id}` | [`handlers::download::file_request`] |
//! | POST | `/documents` | [`handlers::upload::document`] |
//! | POST | `/documents/{id}/versions` | [`handlers::upload::version`] |
//! | POST | `/file-requests/documents` | [`handlers::upload::file_request`] |

pub mod error;
pub mod etag;
pub mod handlers;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use dossier_classify::{ClassificationPipeline, Classifier, ClassifierConfig};
use dossier_core::store::DocumentStore;
use dossier_storage::{Storage, StorageConfig};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{download, upload};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DOSSIER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Upper bound on request bodies, uploads included.
  pub max_upload_bytes: usize,
  pub storage:          StorageConfig,
  pub classifier:       ClassifierConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_owned(),
      port:             8080,
      store_path:       PathBuf::from("dossier.db"),
      max_upload_bytes: 25 * 1024 * 1024,
      storage:          StorageConfig::default(),
      classifier:       ClassifierConfig::default(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, C> {
  pub store:    Arc<S>,
  pub storage:  Arc<Storage>,
  pub pipeline: ClassificationPipeline<S, C>,
  pub config:   Arc<ServerConfig>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      storage:  Arc::clone(&self.storage),
      pipeline: self.pipeline.clone(),
      config:   Arc::clone(&self.config),
    }
  }
}

impl<S, C> AppState<S, C>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  pub fn new(store: Arc<S>, storage: Arc<Storage>, classifier: Arc<C>, config: ServerConfig) -> Self {
    let pipeline = ClassificationPipeline::new(store.clone(), storage.clone(), classifier);
    Self { store, storage, pipeline, config: Arc::new(config) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let body_limit = state.config.max_upload_bytes;
  let api = dossier_api::api_router(state.store.clone());

  Router::new()
    .route("/documents",                post(upload::document::<S, C>))
    .route("/documents/{id}",           get(download::document::<S, C>))
    .route("/documents/{id}/text",      get(download::document_text::<S, C>))
    .route("/documents/{id}/access",    get(download::access::<S, C>))
    .route("/documents/{id}/versions",  post(upload::version::<S, C>))
    .route("/share/{code}",             get(download::share::<S, C>))
    .route("/share/{code}/text",        get(download::share_text::<S, C>))
    .route("/file-requests/documents",  post(upload::file_request::<S, C>))
    .route("/file-requests/{id}",       get(download::file_request::<S, C>))
    .with_state(state)
    .nest("/api", api)
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
}
