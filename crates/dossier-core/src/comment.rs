//! Comments left on documents by callers with view access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Caller;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentComment {
  pub comment_id:  Uuid,
  pub document_id: Uuid,
  pub author_id:   Uuid,
  pub body:        String,
  /// Workflow status the author attached to the comment, if any.
  pub status_id:   Option<Uuid>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub document_id: Uuid,
  pub author_id:   Uuid,
  pub body:        String,
  pub status_id:   Option<Uuid>,
}

impl DocumentComment {
  /// Authors, the document's owner and administrators may remove a comment.
  pub fn removable_by(&self, caller: &Caller, document_owner: Uuid) -> bool {
    caller.is_admin || caller.user_id == self.author_id || caller.user_id == document_owner
  }
}
