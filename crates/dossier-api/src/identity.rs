//! Caller identity from trusted gateway headers.
//!
//! Session issuance happens upstream. The gateway asserts who is calling
//! with three headers:
//!
//! | Header | Value |
//! |--------|-------|
//! | `x-user-id` | UUID, required |
//! | `x-user-roles` | comma-separated role UUIDs |
//! | `x-user-admin` | `true` for administrator-equivalent callers |

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use dossier_core::access::Caller;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";
pub const USER_ADMIN_HEADER: &str = "x-user-admin";

/// An identified caller. Extracting it rejects the request with
/// `unauthenticated` when the headers are missing or malformed.
#[derive(Debug, Clone)]
pub struct Identity(pub Caller);

/// Parse the identity headers. `Ok(None)` when no user id was sent.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Option<Caller>, ApiError> {
  let Some(raw_id) = headers.get(USER_ID_HEADER) else {
    return Ok(None);
  };
  let user_id = raw_id
    .to_str()
    .ok()
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .ok_or_else(|| ApiError::Unauthenticated(format!("{USER_ID_HEADER} is not a UUID")))?;

  let role_ids = match headers.get(USER_ROLES_HEADER) {
    None => Vec::new(),
    Some(raw) => raw
      .to_str()
      .map_err(|_| ApiError::Unauthenticated(format!("{USER_ROLES_HEADER} is not text")))?
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(|s| {
        Uuid::parse_str(s).map_err(|_| {
          ApiError::Unauthenticated(format!("{USER_ROLES_HEADER} contains {s:?}"))
        })
      })
      .collect::<Result<Vec<_>, _>>()?,
  };

  let is_admin = headers
    .get(USER_ADMIN_HEADER)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

  Ok(Some(Caller { user_id, role_ids, is_admin }))
}

impl<S> FromRequestParts<S> for Identity
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    caller_from_headers(&parts.headers)?
      .map(Identity)
      .ok_or_else(|| ApiError::Unauthenticated(format!("{USER_ID_HEADER} header is required")))
  }
}
