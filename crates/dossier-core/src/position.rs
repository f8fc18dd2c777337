//! Positions: the organisational units documents are filed under and
//! classified into.
//!
//! Positions form a forest through a nullable `parent_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
  pub position_id: Uuid,
  pub name:        String,
  pub parent_id:   Option<Uuid>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPosition {
  pub name:      String,
  pub parent_id: Option<Uuid>,
}
