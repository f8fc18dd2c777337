//! Permission grants: who may see or download a document, and when.
//!
//! Grants are keyed either by a user or by a role. Both kinds share one
//! shape; the [`Grantee`] discriminant records which table a row lives in.
//! Grants are never removed when they lapse, they just stop being valid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The party a grant is issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Grantee {
  User(Uuid),
  Role(Uuid),
}

/// The validity window of a grant.
///
/// When `is_time_bound` is false the dates are ignored entirely. A time-bound
/// window with either end missing is misconfigured and never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantWindow {
  pub is_time_bound: bool,
  pub start_date:    Option<DateTime<Utc>>,
  pub end_date:      Option<DateTime<Utc>>,
}

impl GrantWindow {
  /// A window with no temporal boundary.
  pub fn unbounded() -> Self { Self::default() }

  /// A window valid from `start` to `end`, both inclusive.
  pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    Self {
      is_time_bound: true,
      start_date:    Some(start),
      end_date:      Some(end),
    }
  }

  pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
    if !self.is_time_bound {
      return true;
    }
    match (self.start_date, self.end_date) {
      (Some(start), Some(end)) => start <= at && at <= end,
      _ => false,
    }
  }
}

/// A persisted permission grant on one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
  pub grant_id:       Uuid,
  pub document_id:    Uuid,
  pub grantee:        Grantee,
  #[serde(flatten)]
  pub window:         GrantWindow,
  pub allow_download: bool,
  pub created_at:     DateTime<Utc>,
}

impl PermissionGrant {
  pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
    self.window.is_valid_at(at)
  }
}

/// Input to [`crate::store::DocumentStore::add_grant`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewGrant {
  pub document_id:    Uuid,
  pub grantee:        Grantee,
  #[serde(flatten)]
  pub window:         GrantWindow,
  #[serde(default)]
  pub allow_download: bool,
}
