//! Ingestion entry points.
//!
//! | Route | Identity | Fields |
//! |-------|----------|--------|
//! | `POST /documents` | required | `name`, `file`, `categoryId?`, `location?`, `autoAssign?` |
//! | `POST /documents/{id}/versions` | owner | `file`, `location?` |
//! | `POST /file-requests/documents` | none | `name`, `file` |
//!
//! Bytes are written first. A record is only created once the backend has
//! confirmed the write, and the bytes are removed again if the record
//! cannot be created.

use std::collections::HashMap;

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
};
use bytes::Bytes;
use dossier_api::{ApiError, FieldError, Identity, guard};
use dossier_classify::Classifier;
use dossier_core::{
  document::{BackendTag, Document, DocumentVersion, NewDocument, NewVersion, StoredContent},
  file_request::{FileRequestDocument, NewFileRequestDocument},
  store::DocumentStore,
};
use dossier_storage::Storage;
use uuid::Uuid;

use crate::{AppState, error};

const DOCUMENT_FIELDS: &[&str] = &["name", "categoryId", "location", "autoAssign"];
const VERSION_FIELDS: &[&str] = &["location"];
const FILE_REQUEST_FIELDS: &[&str] = &["name"];

// ─── Form parsing ────────────────────────────────────────────────────────────

struct FilePart {
  filename: String,
  bytes:    Bytes,
}

/// A multipart body split into its text fields and the `file` part, with
/// field errors collected as they are found.
struct Form {
  text:   HashMap<String, String>,
  file:   Option<FilePart>,
  errors: Vec<FieldError>,
}

impl Form {
  async fn read(mut multipart: Multipart, allowed: &[&str], limit: usize) -> Result<Self, ApiError> {
    let mut form = Self { text: HashMap::new(), file: None, errors: Vec::new() };

    while let Some(field) = multipart.next_field().await.map_err(|e| error::multipart(e, limit))? {
      let Some(name) = field.name().map(str::to_owned) else {
        continue;
      };
      if name == "file" {
        let filename = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(|e| error::multipart(e, limit))?;
        form.file = Some(FilePart { filename, bytes });
      } else if allowed.contains(&name.as_str()) {
        let value = field.text().await.map_err(|e| error::multipart(e, limit))?;
        form.text.insert(name, value);
      } else {
        form.errors.push(FieldError::new(name, "unknown field"));
      }
    }
    Ok(form)
  }

  /// A trimmed, non-empty text value.
  fn text(&mut self, field: &str) -> Option<String> {
    self
      .text
      .remove(field)
      .map(|v| v.trim().to_owned())
      .filter(|v| !v.is_empty())
  }

  fn required_text(&mut self, field: &str) -> Option<String> {
    let value = self.text(field);
    if value.is_none() {
      self.errors.push(FieldError::new(field, "is required"));
    }
    value
  }

  fn required_file(&mut self) -> Option<FilePart> {
    match self.file.take() {
      Some(file) if !file.bytes.is_empty() => Some(file),
      Some(_) => {
        self.errors.push(FieldError::new("file", "must not be empty"));
        None
      }
      None => {
        self.errors.push(FieldError::new("file", "is required"));
        None
      }
    }
  }

  fn uuid(&mut self, field: &str) -> Option<Uuid> {
    let raw = self.text(field)?;
    match Uuid::parse_str(&raw) {
      Ok(id) => Some(id),
      Err(_) => {
        self.errors.push(FieldError::new(field, "is not a valid id"));
        None
      }
    }
  }

  fn backend(&mut self, field: &str, default: BackendTag) -> BackendTag {
    let Some(raw) = self.text(field) else {
      return default;
    };
    BackendTag::parse(&raw).unwrap_or_else(|_| {
      self.errors.push(FieldError::new(field, "must be one of: local, s3"));
      default
    })
  }

  fn flag(&mut self, field: &str) -> bool {
    let Some(raw) = self.text(field) else {
      return false;
    };
    match raw.to_ascii_lowercase().as_str() {
      "true" | "1" | "on" | "yes" => true,
      "false" | "0" | "off" | "no" => false,
      _ => {
        self.errors.push(FieldError::new(field, "must be true or false"));
        false
      }
    }
  }

  /// Fail with every collected field error, if there are any.
  fn finish(self) -> Result<(), ApiError> {
    if self.errors.is_empty() { Ok(()) } else { Err(ApiError::Validation(self.errors)) }
  }
}

struct DocumentUpload {
  name:        String,
  file:        FilePart,
  category_id: Option<Uuid>,
  location:    BackendTag,
  auto_assign: bool,
}

impl DocumentUpload {
  fn parse(mut form: Form) -> Result<Self, ApiError> {
    let name = form.required_text("name");
    let file = form.required_file();
    let category_id = form.uuid("categoryId");
    let location = form.backend("location", BackendTag::Local);
    let auto_assign = form.flag("autoAssign");
    form.finish()?;

    match (name, file) {
      (Some(name), Some(file)) => Ok(Self { name, file, category_id, location, auto_assign }),
      _ => Err(ApiError::invalid("file", "is required")),
    }
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST /documents`
pub async fn document<S, C>(
  State(state): State<AppState<S, C>>,
  Identity(caller): Identity,
  multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let form = Form::read(multipart, DOCUMENT_FIELDS, state.config.max_upload_bytes).await?;
  let upload = DocumentUpload::parse(form)?;

  if let Some(category_id) = upload.category_id {
    let exists = state.store.get_position(category_id).await.map_err(ApiError::store)?;
    if exists.is_none() {
      return Err(ApiError::invalid("categoryId", "does not name an existing position"));
    }
  }

  let suggested = suggested_name(&upload.file, &upload.name);
  let content = state
    .storage
    .write("documents", &suggested, upload.location, upload.file.bytes)
    .await
    .map_err(error::storage)?;

  let created = state
    .store
    .create_document(NewDocument {
      name:        upload.name,
      content:     content.clone(),
      category_id: upload.category_id,
      client_id:   None,
      status_id:   None,
      created_by:  caller.user_id,
    })
    .await;
  let document = match created {
    Ok(document) => document,
    Err(e) => {
      discard(&state.storage, &content).await;
      return Err(ApiError::store(e));
    }
  };

  tracing::info!(
    document_id = %document.document_id,
    backend = %content.backend,
    auto_assign = upload.auto_assign,
    "document uploaded"
  );
  if upload.auto_assign {
    state.pipeline.spawn(document.document_id);
  }
  Ok((StatusCode::CREATED, Json(document)))
}

/// `POST /documents/{id}/versions`: new bytes for an existing document.
/// The document row itself is left as it is.
pub async fn version<S, C>(
  State(state): State<AppState<S, C>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentVersion>), ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let document = guard::load_document(&*state.store, id).await?;
  guard::require_owner(&document, &caller)?;

  let mut form = Form::read(multipart, VERSION_FIELDS, state.config.max_upload_bytes).await?;
  let file = form.required_file();
  let location = form.backend("location", document.content.backend);
  form.finish()?;
  let file = file.ok_or_else(|| ApiError::invalid("file", "is required"))?;

  let suggested = suggested_name(&file, &document.name);
  let content = state
    .storage
    .write("versions", &suggested, location, file.bytes)
    .await
    .map_err(error::storage)?;

  let added = state
    .store
    .add_version(NewVersion { document_id: id, content: content.clone(), created_by: caller.user_id })
    .await;
  let version = match added {
    Ok(version) => version,
    Err(e) => {
      discard(&state.storage, &content).await;
      return Err(ApiError::store(e));
    }
  };

  tracing::info!(document_id = %id, version_id = %version.version_id, "version uploaded");
  Ok((StatusCode::CREATED, Json(version)))
}

/// `POST /file-requests/documents`: anonymous submissions, always stored
/// locally.
pub async fn file_request<S, C>(
  State(state): State<AppState<S, C>>,
  multipart: Multipart,
) -> Result<(StatusCode, Json<FileRequestDocument>), ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let mut form = Form::read(multipart, FILE_REQUEST_FIELDS, state.config.max_upload_bytes).await?;
  let name = form.required_text("name");
  let file = form.required_file();
  form.finish()?;
  let (Some(name), Some(file)) = (name, file) else {
    return Err(ApiError::invalid("file", "is required"));
  };

  let suggested = suggested_name(&file, &name);
  let content = state
    .storage
    .write("file-requests", &suggested, BackendTag::Local, file.bytes)
    .await
    .map_err(error::storage)?;

  let added = state
    .store
    .add_file_request_document(NewFileRequestDocument { name, content: content.clone() })
    .await;
  let document = match added {
    Ok(document) => document,
    Err(e) => {
      discard(&state.storage, &content).await;
      return Err(ApiError::store(e));
    }
  };

  tracing::info!(file_request_document_id = %document.file_request_document_id, "file request received");
  Ok((StatusCode::CREATED, Json(document)))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The client's filename carries the extension; fall back to the logical
/// name when the part had none.
fn suggested_name(file: &FilePart, name: &str) -> String {
  if file.filename.is_empty() { name.to_owned() } else { file.filename.clone() }
}

/// Remove bytes whose record could not be committed.
async fn discard(storage: &Storage, content: &StoredContent) {
  if let Err(e) = storage.delete(content.backend, &content.storage_path).await {
    tracing::warn!(
      backend = %content.backend,
      path = %content.storage_path,
      error = %e,
      "could not remove orphaned file"
    );
  }
}
