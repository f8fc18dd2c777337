//! Per-document access checks shared by the handlers.

use chrono::Utc;
use dossier_core::{
  access::{self, AccessDecision, Caller, Principal},
  document::Document,
  store::DocumentStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// Fetch a document by id, archived or not.
pub async fn load_document<S: DocumentStore>(store: &S, id: Uuid) -> Result<Document, ApiError> {
  store
    .get_document(id, true)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))
}

/// Evaluate the caller's grants on `document` as of now.
pub async fn decide<S: DocumentStore>(
  store: &S,
  document: &Document,
  caller: &Caller,
) -> Result<AccessDecision, ApiError> {
  let grants = store
    .grants_for_caller(document.document_id, caller.user_id, &caller.role_ids)
    .await
    .map_err(ApiError::store)?;
  Ok(access::evaluate(
    document,
    &Principal::Caller(caller.clone()),
    &grants,
    Utc::now(),
  ))
}

pub async fn require_view<S: DocumentStore>(
  store: &S,
  document: &Document,
  caller: &Caller,
) -> Result<AccessDecision, ApiError> {
  let decision = decide(store, document, caller).await?;
  if decision.can_view {
    Ok(decision)
  } else {
    Err(ApiError::AccessDenied(format!("no access to document {}", document.document_id)))
  }
}

/// Metadata changes, grants and links are reserved for the document's
/// creator and administrators.
pub fn require_owner(document: &Document, caller: &Caller) -> Result<(), ApiError> {
  if caller.is_admin || caller.user_id == document.created_by {
    Ok(())
  } else {
    Err(ApiError::AccessDenied(format!(
      "only the owner may manage document {}",
      document.document_id
    )))
  }
}

pub fn require_admin(caller: &Caller) -> Result<(), ApiError> {
  if caller.is_admin {
    Ok(())
  } else {
    Err(ApiError::AccessDenied("administrator access required".into()))
  }
}
