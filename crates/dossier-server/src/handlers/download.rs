//! Retrieval entry points.
//!
//! Every route follows the same path: resolve the identifier, authorise the
//! caller against what it resolved to, then stream the bytes back from the
//! backend the record names.
//!
//! | Route | Identity |
//! |-------|----------|
//! | `GET /documents/{id}?version=&disposition=` | required |
//! | `GET /documents/{id}/text?version=` | required |
//! | `GET /documents/{id}/access?version=` | required |
//! | `GET /share/{code}?password=&disposition=` | none |
//! | `GET /share/{code}/text?password=` | none |
//! | `GET /file-requests/{id}?disposition=` | none |

use axum::{
  Json,
  body::Body,
  extract::{Path, Query, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::Response,
};
use bytes::Bytes;
use chrono::Utc;
use dossier_api::{ApiError, Identity};
use dossier_classify::Classifier;
use dossier_core::{
  access::{AccessDecision, Caller},
  resolve::{self, Authorization, Locator, ResolvedTarget},
  store::DocumentStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error, etag};

/// Optional share-link password header, for clients that should not put it
/// in the URL.
pub const LINK_PASSWORD_HEADER: &str = "x-link-password";

// ─── Query parameters ────────────────────────────────────────────────────────

/// How the client intends to use the bytes. Viewing needs view access,
/// downloading needs download access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
  Inline,
  #[default]
  Attachment,
}

impl Disposition {
  fn allowed(self, decision: &AccessDecision) -> bool {
    match self {
      Self::Inline => decision.can_view,
      Self::Attachment => decision.can_download,
    }
  }

  fn as_str(self) -> &'static str {
    match self {
      Self::Inline => "inline",
      Self::Attachment => "attachment",
    }
  }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentParams {
  /// Interpret the id as a version id.
  pub version:     bool,
  pub disposition: Disposition,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ShareParams {
  pub password:    Option<String>,
  pub disposition: Disposition,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct FileRequestParams {
  pub disposition: Disposition,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /documents/{id}`
pub async fn document<S, C>(
  State(state): State<AppState<S, C>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  Query(params): Query<DocumentParams>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let locator = Locator::direct(id, params.version);
  let target = resolve_and_permit(&state, locator, Some(&caller), params.disposition).await?;
  deliver(&state, &target, params.disposition, &headers).await
}

/// `GET /documents/{id}/text`
pub async fn document_text<S, C>(
  State(state): State<AppState<S, C>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  Query(params): Query<DocumentParams>,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let locator = Locator::direct(id, params.version);
  let target = resolve_and_permit(&state, locator, Some(&caller), Disposition::Inline).await?;
  read_text(&state, &target).await
}

/// `GET /documents/{id}/access`: the caller's evaluated rights, without the
/// bytes.
pub async fn access<S, C>(
  State(state): State<AppState<S, C>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  Query(params): Query<DocumentParams>,
) -> Result<Json<AccessDecision>, ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let now = Utc::now();
  let target = resolve::resolve(&*state.store, Locator::direct(id, params.version), now).await?;
  match resolve::authorize(&*state.store, &target, Some(&caller), now).await? {
    Authorization::Decided(decision) => Ok(Json(decision)),
    Authorization::IdentityRequired => Err(identity_required()),
  }
}

/// `GET /share/{code}`
pub async fn share<S, C>(
  State(state): State<AppState<S, C>>,
  Path(code): Path<String>,
  Query(params): Query<ShareParams>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let locator = share_locator(code, params.password, &headers);
  let target = resolve_and_permit(&state, locator, None, params.disposition).await?;
  deliver(&state, &target, params.disposition, &headers).await
}

/// `GET /share/{code}/text`
pub async fn share_text<S, C>(
  State(state): State<AppState<S, C>>,
  Path(code): Path<String>,
  Query(params): Query<ShareParams>,
  headers: HeaderMap,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let locator = share_locator(code, params.password, &headers);
  let target = resolve_and_permit(&state, locator, None, Disposition::Inline).await?;
  read_text(&state, &target).await
}

/// `GET /file-requests/{id}`
pub async fn file_request<S, C>(
  State(state): State<AppState<S, C>>,
  Path(id): Path<Uuid>,
  Query(params): Query<FileRequestParams>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let target =
    resolve_and_permit(&state, Locator::FileRequest(id), None, params.disposition).await?;
  deliver(&state, &target, params.disposition, &headers).await
}

// ─── Shared steps ────────────────────────────────────────────────────────────

fn share_locator(code: String, password: Option<String>, headers: &HeaderMap) -> Locator {
  let password = password.or_else(|| {
    headers
      .get(LINK_PASSWORD_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned)
  });
  Locator::ShareCode { code, password }
}

fn identity_required() -> ApiError {
  ApiError::Unauthenticated("this document requires an identified caller".into())
}

async fn resolve_and_permit<S, C>(
  state: &AppState<S, C>,
  locator: Locator,
  caller: Option<&Caller>,
  disposition: Disposition,
) -> Result<ResolvedTarget, ApiError>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  let now = Utc::now();
  let target = resolve::resolve(&*state.store, locator, now).await?;

  let decision = match resolve::authorize(&*state.store, &target, caller, now).await? {
    Authorization::Decided(decision) => decision,
    Authorization::IdentityRequired => return Err(identity_required()),
  };
  if !disposition.allowed(&decision) {
    let what = match disposition {
      Disposition::Inline => "view",
      Disposition::Attachment => "download",
    };
    return Err(ApiError::AccessDenied(format!("not allowed to {what} this document")));
  }
  Ok(target)
}

async fn read_bytes<S, C>(state: &AppState<S, C>, target: &ResolvedTarget) -> Result<Bytes, ApiError> {
  state
    .storage
    .read(target.backend(), target.storage_path())
    .await
    .map_err(error::storage)
}

async fn read_text<S, C>(
  state: &AppState<S, C>,
  target: &ResolvedTarget,
) -> Result<Json<Value>, ApiError> {
  let mime = state.storage.mime_type(target.storage_path());
  if !mime.starts_with("text/") {
    return Err(ApiError::invalid("document", format!("{mime} is not a text format")));
  }
  let bytes = read_bytes(state, target).await?;
  Ok(Json(json!({ "result": [String::from_utf8_lossy(&bytes)] })))
}

async fn deliver<S, C>(
  state: &AppState<S, C>,
  target: &ResolvedTarget,
  disposition: Disposition,
  headers: &HeaderMap,
) -> Result<Response, ApiError> {
  let etag = etag::for_content(target.content());
  let cache_control = HeaderValue::from_static("no-cache, private");

  if let Some(inm) = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok())
    && etag::none_match(inm, &etag)
  {
    return Response::builder()
      .status(StatusCode::NOT_MODIFIED)
      .header(header::ETAG, &etag)
      .header(header::CACHE_CONTROL, cache_control)
      .body(Body::empty())
      .map_err(|e| ApiError::Internal(Box::new(e)));
  }

  let bytes = read_bytes(state, target).await?;
  let filename = target.display_filename();
  tracing::debug!(
    backend = %target.backend(),
    path = target.storage_path(),
    disposition = disposition.as_str(),
    "serving stored file"
  );

  Response::builder()
    .status(StatusCode::OK)
    .header(header::CONTENT_TYPE, state.storage.mime_type(target.storage_path()))
    .header(header::CONTENT_LENGTH, bytes.len())
    .header(header::CONTENT_DISPOSITION, content_disposition(disposition, &filename))
    .header(header::CACHE_CONTROL, cache_control)
    .header(header::ETAG, &etag)
    .body(Body::from(bytes))
    .map_err(|e| ApiError::Internal(Box::new(e)))
}

/// `inline|attachment; filename="..."; filename*=UTF-8''...`
///
/// The plain `filename` is reduced to printable ASCII; the extended form
/// carries the exact name percent-encoded.
fn content_disposition(disposition: Disposition, filename: &str) -> String {
  let fallback: String = filename
    .chars()
    .map(|c| if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') { c } else { '_' })
    .collect();

  let mut encoded = String::with_capacity(filename.len());
  for byte in filename.bytes() {
    if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
      encoded.push(byte as char);
    } else {
      encoded.push_str(&format!("%{byte:02X}"));
    }
  }

  format!("{}; filename=\"{fallback}\"; filename*=UTF-8''{encoded}", disposition.as_str())
}
