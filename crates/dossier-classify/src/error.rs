//! Error types for the classification client.
//!
//! Every variant ends a task as a transient failure; none of them reach the
//! uploader.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("classifier is not configured: {0}")]
  NotConfigured(&'static str),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("classifier answered {status}: {body}")]
  Status { status: u16, body: String },

  #[error("unexpected reply envelope: {0}")]
  Envelope(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
