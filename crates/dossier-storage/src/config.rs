//! Backend configuration, deserialised from the server's config file.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  #[serde(default)]
  pub local: LocalConfig,
  /// Absent means the `s3` backend is not configured at all.
  #[serde(default)]
  pub s3:    Option<S3Config>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalConfig {
  pub root: PathBuf,
}

impl Default for LocalConfig {
  fn default() -> Self { Self { root: PathBuf::from("storage") } }
}

/// Connection settings for an S3-compatible object store.
///
/// Every field defaults to empty so that a partially filled section still
/// parses; [`S3Config::missing_fields`] reports what is absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct S3Config {
  /// Custom endpoint for non-AWS providers.
  pub endpoint:          Option<String>,
  pub bucket:            String,
  pub region:            String,
  pub access_key_id:     String,
  pub secret_access_key: String,
}

impl S3Config {
  /// Names of the required settings that are blank.
  pub fn missing_fields(&self) -> Vec<&'static str> {
    [
      ("access_key_id", &self.access_key_id),
      ("secret_access_key", &self.secret_access_key),
      ("region", &self.region),
      ("bucket", &self.bucket),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect()
  }

  pub fn is_complete(&self) -> bool { self.missing_fields().is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn complete_config_has_no_missing_fields() {
    let cfg = S3Config {
      endpoint:          None,
      bucket:            "docs".into(),
      region:            "eu-west-1".into(),
      access_key_id:     "AKIA".into(),
      secret_access_key: "secret".into(),
    };
    assert!(cfg.is_complete());
  }

  #[test]
  fn blank_fields_are_reported_by_name() {
    let cfg = S3Config {
      bucket: "docs".into(),
      region: "  ".into(),
      ..Default::default()
    };
    assert_eq!(
      cfg.missing_fields(),
      vec!["access_key_id", "secret_access_key", "region"]
    );
  }
}
