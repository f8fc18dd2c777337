//! The permission evaluator.
//!
//! Access to a document is the union of every grant the caller holds, either
//! directly or through one of their roles. View needs one currently valid
//! grant; download needs one currently valid grant that allows it. The widest
//! applicable grant wins, so a valid grant that denies download never cancels
//! one that allows it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  document::Document,
  grant::{Grantee, PermissionGrant},
};

// ─── Principals ──────────────────────────────────────────────────────────────

/// An identified caller, as asserted by the authenticating layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
  pub user_id:  Uuid,
  /// Every role the caller currently holds.
  #[serde(default)]
  pub role_ids: Vec<Uuid>,
  /// Administrator-equivalent identities bypass grants entirely.
  #[serde(default)]
  pub is_admin: bool,
}

impl Caller {
  pub fn new(user_id: Uuid) -> Self {
    Self { user_id, role_ids: Vec::new(), is_admin: false }
  }

  /// Whether `grant` was issued to this caller or to a role they hold.
  pub fn holds(&self, grant: &PermissionGrant) -> bool {
    match grant.grantee {
      Grantee::User(id) => id == self.user_id,
      Grantee::Role(id) => self.role_ids.contains(&id),
    }
  }
}

/// Who is asking for access.
#[derive(Debug, Clone)]
pub enum Principal {
  Caller(Caller),
  /// A caller that presented a share code (and password, if the link has
  /// one) that the resolver has already validated.
  AnonymousLink { allow_download: bool },
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// Why access was (or was not) granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessBasis {
  /// The caller created the document or is an administrator.
  Owner,
  /// At least one of the caller's grants is currently valid.
  Grants,
  /// A validated share link.
  Link,
  /// Nothing applies.
  Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
  pub can_view:     bool,
  pub can_download: bool,
  /// Latest end date across the caller's time-bound grants, for display.
  pub due_date:     Option<DateTime<Utc>>,
  pub basis:        AccessBasis,
}

impl AccessDecision {
  fn denied(due_date: Option<DateTime<Utc>>) -> Self {
    Self {
      can_view: false,
      can_download: false,
      due_date,
      basis: AccessBasis::Denied,
    }
  }
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

/// Compute the effective access of `principal` to `document` at `now`.
///
/// `grants` may contain grants belonging to other parties; only those held by
/// the caller are considered.
pub fn evaluate(
  document: &Document,
  principal: &Principal,
  grants: &[PermissionGrant],
  now: DateTime<Utc>,
) -> AccessDecision {
  let caller = match principal {
    Principal::AnonymousLink { allow_download } => {
      return AccessDecision {
        can_view:     true,
        can_download: *allow_download,
        due_date:     None,
        basis:        AccessBasis::Link,
      };
    }
    Principal::Caller(caller) => caller,
  };

  let held: Vec<&PermissionGrant> = grants
    .iter()
    .filter(|g| g.document_id == document.document_id && caller.holds(g))
    .collect();

  let due_date = due_date(held.iter().copied());

  if caller.is_admin || document.created_by == caller.user_id {
    return AccessDecision {
      can_view: true,
      can_download: true,
      due_date,
      basis: AccessBasis::Owner,
    };
  }

  let mut valid = held.iter().filter(|g| g.is_valid_at(now)).peekable();
  if valid.peek().is_none() {
    return AccessDecision::denied(due_date);
  }

  AccessDecision {
    can_view: true,
    can_download: valid.any(|g| g.allow_download),
    due_date,
    basis: AccessBasis::Grants,
  }
}

/// The maximum end date across time-bound grants. Unbounded grants have no
/// end and never contribute.
pub fn due_date<'a>(
  grants: impl IntoIterator<Item = &'a PermissionGrant>,
) -> Option<DateTime<Utc>> {
  grants
    .into_iter()
    .filter(|g| g.window.is_time_bound)
    .filter_map(|g| g.window.end_date)
    .max()
}
