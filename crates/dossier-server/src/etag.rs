//! Strong ETags for stored files.
//!
//! The ETag of a file is its SHA-256 content hash, quoted. Two records that
//! point at identical bytes share an ETag.

use dossier_core::document::StoredContent;

/// Quoted ETag for `content`.
pub fn for_content(content: &StoredContent) -> String {
  format!("\"{}\"", content.content_hash)
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Accepts `*`, comma-separated lists, weak validators and unquoted values.
pub fn none_match(header: &str, etag: &str) -> bool {
  let wanted = strip_etag_quotes(etag);
  header.split(',').map(str::trim).any(|candidate| {
    candidate == "*" || strip_etag_quotes(candidate.trim_start_matches("W/")) == wanted
  })
}

/// Strip surrounding double-quotes from an ETag value.
fn strip_etag_quotes(s: &str) -> &str { s.trim_matches('"') }
