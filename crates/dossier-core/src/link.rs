//! Shareable links: anonymous, optionally password-protected access to one
//! document.
//!
//! Link passwords are stored as argon2 PHC strings. Callers still submit the
//! plaintext password; only the stored form differs.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Number of random bytes behind a share code (hex-encoded on the wire).
const CODE_BYTES: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareableLink {
  /// Opaque external identifier.
  pub code:           String,
  pub document_id:    Uuid,
  #[serde(skip_serializing, default)]
  pub password_hash:  Option<String>,
  pub allow_download: bool,
  pub expires_at:     Option<DateTime<Utc>>,
  pub is_active:      bool,
  pub created_by:     Uuid,
  pub created_at:     DateTime<Utc>,
}

impl ShareableLink {
  /// Whether the link still opens: active and not past its expiry.
  pub fn is_live_at(&self, at: DateTime<Utc>) -> bool {
    self.is_active && self.expires_at.is_none_or(|exp| at <= exp)
  }

  pub fn is_protected(&self) -> bool { self.password_hash.is_some() }

  /// Check a caller-supplied password. Unprotected links accept anything.
  pub fn accepts_password(&self, candidate: Option<&str>) -> bool {
    match &self.password_hash {
      None => true,
      Some(hash) => candidate.is_some_and(|pw| verify_password(hash, pw)),
    }
  }
}

/// Input to [`crate::store::DocumentStore::create_share_link`].
#[derive(Debug, Clone)]
pub struct NewShareLink {
  pub document_id:    Uuid,
  /// Already hashed with [`hash_password`]; never plaintext.
  pub password_hash:  Option<String>,
  pub allow_download: bool,
  pub expires_at:     Option<DateTime<Utc>>,
  pub created_by:     Uuid,
}

/// Generate a fresh share code from the OS random source.
pub fn generate_code() -> String {
  let mut buf = [0u8; CODE_BYTES];
  OsRng.fill_bytes(&mut buf);
  hex::encode(buf)
}

/// Hash a link password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Verify `password` against a stored PHC string. A malformed stored hash
/// never verifies.
pub fn verify_password(hash: &str, password: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}
