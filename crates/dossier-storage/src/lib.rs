//! Byte-level access to the named storage backends a document can live on.
//!
//! Every stored record carries a [`BackendTag`](dossier_core::document::BackendTag)
//! and a path; [`Storage`] maps the tag to an `opendal` operator and performs
//! the read or write. Writes are gated on the backend being fully configured,
//! reads only on the backend being reachable at all, so that content already
//! stored on a backend stays readable after its write configuration breaks.

mod config;
mod error;
mod mime;
mod storage;

pub use config::{LocalConfig, S3Config, StorageConfig};
pub use error::{Result, StorageError};
pub use mime::mime_type;
pub use storage::{Storage, WriteReadiness};
