//! Document statuses: a small admin-managed vocabulary ("Draft",
//! "Approved", ...) referenced by documents and comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatus {
  pub status_id:  Uuid,
  pub name:       String,
  /// Display colour, e.g. `#2e7d32`. Opaque to the store.
  pub color_code: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStatus {
  pub name:       String,
  #[serde(default)]
  pub color_code: Option<String>,
}

/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPatch {
  pub name:       Option<String>,
  pub color_code: Option<String>,
}
