//! Documents received through the file-request flow.
//!
//! These have no grants; knowing the id is the only access control. Their
//! bytes always live on the local backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::StoredContent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRequestDocument {
  pub file_request_document_id: Uuid,
  pub name:                     String,
  pub content:                  StoredContent,
  pub created_at:               DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFileRequestDocument {
  pub name:    String,
  pub content: StoredContent,
}
