//! Classification results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The latest automated department assignment for a document. One row per
/// document; each completed classification replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationAssignment {
  pub document_id:  Uuid,
  /// `None` when no confident match was found.
  pub position_id:  Option<Uuid>,
  /// The raw top department name returned by the classifier, if any.
  pub source_label: Option<String>,
  pub created_at:   DateTime<Utc>,
}

/// The terminal state of one classification task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClassificationOutcome {
  /// The top label matched a position.
  Resolved { position_id: Uuid, label: String },
  /// The reply was unusable, or its top label matched no position.
  Unresolved { label: Option<String> },
  /// The service could not be reached or answered with an error.
  TransientFailure { reason: String },
}

impl ClassificationOutcome {
  /// The assignment row this outcome should leave behind, if any. Transient
  /// failures write nothing.
  pub fn assignment(&self, document_id: Uuid) -> Option<ClassificationAssignment> {
    let (position_id, source_label) = match self {
      Self::Resolved { position_id, label } => (Some(*position_id), Some(label.clone())),
      Self::Unresolved { label } => (None, label.clone()),
      Self::TransientFailure { .. } => return None,
    };
    Some(ClassificationAssignment {
      document_id,
      position_id,
      source_label,
      created_at: Utc::now(),
    })
  }
}
