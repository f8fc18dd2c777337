//! Extension-based MIME type detection.

/// Guess the MIME type of a stored file from its extension.
///
/// Unknown or missing extensions fall back to `application/octet-stream`.
pub fn mime_type(path: &str) -> &'static str {
  mime_guess::from_path(path)
    .first_raw()
    .unwrap_or("application/octet-stream")
}

/// The extension of the final path segment, without the dot.
pub(crate) fn extension(path: &str) -> Option<&str> {
  let file = path.rsplit('/').next().unwrap_or(path);
  match file.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_extensions_map_case_insensitively() {
    assert_eq!(mime_type("documents/a.PDF"), "application/pdf");
    assert_eq!(mime_type("documents/a.jpeg"), "image/jpeg");
    assert_eq!(mime_type("notes.txt"), "text/plain");
  }

  #[test]
  fn unknown_or_missing_extension_is_octet_stream() {
    assert_eq!(mime_type("documents/blob"), "application/octet-stream");
    assert_eq!(mime_type("documents/a.notarealextension"), "application/octet-stream");
    assert_eq!(mime_type("documents/.hidden"), "application/octet-stream");
  }

  #[test]
  fn extension_ignores_dots_in_directories() {
    assert_eq!(extension("v1.2/readme"), None);
    assert_eq!(extension("v1.2/readme.md"), Some("md"));
  }
}
