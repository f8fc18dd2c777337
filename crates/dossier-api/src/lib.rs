//! JSON REST API for Dossier's administrative surface.
//!
//! Exposes an axum [`Router`] backed by any
//! [`dossier_core::store::DocumentStore`]. Callers are identified by
//! gateway headers (see [`identity`]); TLS and session issuance are the
//! deployment's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dossier_api::api_router(store.clone()))
//! ```

pub mod comments;
pub mod documents;
pub mod error;
pub mod grants;
pub mod guard;
pub mod identity;
pub mod links;
pub mod positions;
pub mod statuses;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use dossier_core::store::DocumentStore;

pub use error::{ApiError, FieldError};
pub use identity::Identity;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: DocumentStore + 'static,
{
  Router::new()
    // Positions
    .route("/positions", get(positions::list::<S>).post(positions::create::<S>))
    .route("/positions/roots", get(positions::roots::<S>))
    .route(
      "/positions/{id}",
      get(positions::get_one::<S>).delete(positions::delete_one::<S>),
    )
    .route("/positions/{id}/children", get(positions::children::<S>))
    // Documents
    .route("/documents", get(documents::list::<S>))
    .route(
      "/documents/{id}",
      get(documents::get_one::<S>).patch(documents::update::<S>),
    )
    .route("/documents/{id}/archive", post(documents::archive::<S>))
    .route("/documents/{id}/versions", get(documents::versions::<S>))
    .route("/documents/{id}/classification", get(documents::classification::<S>))
    .route("/versions/{id}/archive", post(documents::archive_version::<S>))
    // Grants
    .route(
      "/documents/{id}/grants",
      get(grants::list::<S>).post(grants::create::<S>),
    )
    // Share links
    .route("/documents/{id}/links", post(links::create::<S>))
    .route("/links/{code}/deactivate", post(links::deactivate::<S>))
    // Comments
    .route(
      "/documents/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    .route("/comments/{id}", delete(comments::delete_one::<S>))
    // Statuses
    .route("/statuses", get(statuses::list::<S>).post(statuses::create::<S>))
    .route(
      "/statuses/{id}",
      get(statuses::get_one::<S>)
        .patch(statuses::update::<S>)
        .delete(statuses::delete_one::<S>),
    )
    .with_state(store)
}
